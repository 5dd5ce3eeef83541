use std::env;
use std::path::PathBuf;

use cms_blog::config::{read_config, Config};

use crate::CFG_FILE_NAME;

fn get_config_path() -> Option<PathBuf> {
    let candidates = [
        env::current_exe().ok().and_then(|exe| exe.parent().map(|dir| dir.join(CFG_FILE_NAME))),
        env::current_dir().ok().map(|dir| dir.join(CFG_FILE_NAME)),
        dirs::config_dir().map(|dir| dir.join(CFG_FILE_NAME)),
    ];

    candidates.into_iter()
        .flatten()
        .find(|path| path.exists())
}

pub(crate) fn open_config(cfg_path: Option<PathBuf>) -> Result<Config, String> {
    let config_path = match cfg_path.or_else(get_config_path) {
        None => return Err("Could not find cms-blog configuration".to_string()),
        Some(x) => x,
    };

    println!("Reading config from {}", config_path.display());
    let mut config = match read_config(&config_path) {
        Ok(config) => config,
        Err(e) => return Err(e.to_string()),
    };

    if let Some(mut log) = config.log {
        if log.location.is_none() && !log.log_to_console {
            let location = dirs::cache_dir()
                .map(|dir| dir.join("cms-blog").join("log").join("server.log"));
            log.location = location;
        }
        match log.location {
            Some(ref location) => println!("Log enabled. Files will be written in {}", location.display()),
            None => println!("Log enabled. Using console"),
        }
        config.log = Some(log);
    } else {
        println!("Log disabled. Using stdout");
    }

    Ok(config)
}
