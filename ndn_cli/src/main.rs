use anyhow::anyhow;
use clap::Parser;
use log::*;
use ndn_cli::config::{CliCommand, Config, GlobalOptions};
use ndn_cli::fetch::run_fetch;
use ndn_face::{ConfigError, FaceConfig};

#[tokio::main]
async fn main() {
    env_logger::init();
    let config: Config = Config::parse();
    let (global_options, command) = config.to_parts();

    let result = match command {
        CliCommand::Fetch(fetch_command) => match load_face_config(&global_options) {
            Ok(face_config) => run_fetch(fetch_command, face_config).await.map(|summary| println!("{summary}")),
            Err(err) => Err(err),
        },
        CliCommand::Config => print_config(&global_options),
    };

    match result {
        Ok(()) => {
            println!("Bye :)")
        }
        Err(err) => {
            eprintln!("** Error ** \n {err}");
            std::process::exit(1);
        }
    }
}

fn load_face_config(options: &GlobalOptions) -> Result<FaceConfig, anyhow::Error> {
    let Some(path) = options.config_file.as_ref() else {
        debug!("No configuration file given. Using defaults.");
        return Ok(FaceConfig::default());
    };
    info!("Loading face configuration from {}", path.to_str().unwrap_or("[invalid utf-8 path]"));
    match FaceConfig::load(path) {
        Ok(config) => Ok(config),
        Err(ConfigError::IoError(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            println!(
                "No configuration file found at {}. Using defaults.",
                path.to_str().unwrap_or("[invalid utf-8 path]")
            );
            Ok(FaceConfig::default())
        }
        Err(err) => Err(anyhow!("Error reading configuration file: {err}")),
    }
}

fn print_config(options: &GlobalOptions) -> Result<(), anyhow::Error> {
    let config = load_face_config(options)?;
    print!("{}", serde_yml::to_string(&config)?);
    Ok(())
}
