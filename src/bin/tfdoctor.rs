use std::io::Read;
use tfdoctor::config::load_settings;
use tfdoctor::handlers::{diagnosis_handler, troubleshoot_handler};
use tfdoctor::secrets::secret_store_from_settings;
use tfdoctor::shared::init_logging;

const HANDLER_ENV: &str = "TFDOCTOR_HANDLER";

fn run() -> Result<(), String> {
    init_logging();
    let settings = load_settings().map_err(|e| e.to_string())?;
    let secrets = secret_store_from_settings(&settings);

    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .map_err(|e| format!("failed to read event from stdin: {e}"))?;
    let event: serde_json::Value =
        serde_json::from_str(&raw).map_err(|e| format!("event is not valid json: {e}"))?;

    let handler = std::env::var(HANDLER_ENV).unwrap_or_else(|_| "troubleshoot".to_string());
    let output = match handler.trim() {
        "diagnose" => serde_json::to_string(&diagnosis_handler(&settings, secrets).handle_event(&event)),
        "troubleshoot" => {
            serde_json::to_string(&troubleshoot_handler(&settings, secrets).handle_event(&event))
        }
        other => {
            return Err(format!(
                "unknown handler `{other}` in {HANDLER_ENV}; expected `diagnose` or `troubleshoot`"
            ))
        }
    }
    .map_err(|e| format!("failed to encode response: {e}"))?;

    println!("{output}");
    Ok(())
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
