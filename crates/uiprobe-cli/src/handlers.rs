//! Subcommand handlers

use crate::commands::{ClickPopupArgs, ConfigArgs, ConfigFormat, DocStatusArgs};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use uiprobe::{CommanderRegistry, PopupButtonClicker, ProbeConfig, Scene, SceneToolkit, TestScript};

/// Load the probe configuration, or the defaults when no file is given
pub fn load_probe_config(path: Option<&Path>) -> CliResult<ProbeConfig> {
    match path {
        Some(path) => {
            let config = ProbeConfig::load(path)?;
            tracing::debug!(path = %path.display(), "loaded probe configuration");
            Ok(config)
        }
        None => Ok(ProbeConfig::default()),
    }
}

/// `click-popup`: click a popup button in a scene file
pub fn run_click_popup(
    probe: &ProbeConfig,
    reporter: &Reporter,
    args: &ClickPopupArgs,
) -> CliResult<()> {
    let mut config = probe.clone();
    if let Some(ms) = args.poll_interval {
        config = config.with_poll_interval(ms);
    }
    config
        .validate()
        .map_err(|e| CliError::config(e.to_string()))?;
    let timeout = args.timeout.unwrap_or(config.default_timeout_secs);

    let scene = Scene::load(&args.scene)?;
    tracing::info!(
        scene = %args.scene.display(),
        dialogs = scene.dialogs.len(),
        "loaded scene"
    );
    let toolkit = Arc::new(SceneToolkit::new(scene)?);
    let registry = CommanderRegistry::with_defaults(toolkit.clone(), &config);

    let spinner = reporter.spinner(&format!("waiting for button {:?}", args.text));
    let result = registry.execute(
        PopupButtonClicker::NAME,
        &[
            Value::String(timeout.to_string()),
            Value::String(args.text.clone()),
        ],
    );
    spinner.finish_and_clear();

    if let Err(e) = result {
        reporter.failure(&e.to_string());
        return Err(e.into());
    }

    let clicks = toolkit.clicks();
    if args.json {
        let json = serde_json::to_string_pretty(&clicks)
            .map_err(|e| CliError::serialization(e.to_string()))?;
        reporter.raw(&json);
    } else {
        reporter.success(&format!("clicked {:?}", args.text));
        for click in &clicks {
            reporter.field(
                "dialog",
                &format!(
                    "{} (on {})",
                    click.dialog,
                    click.thread.as_deref().unwrap_or("unnamed thread")
                ),
            );
        }
    }
    Ok(())
}

/// `doc-status`: report a test script's companion files
pub fn run_doc_status(
    probe: &ProbeConfig,
    reporter: &Reporter,
    args: &DocStatusArgs,
) -> CliResult<()> {
    if !args.script.is_file() {
        return Err(CliError::config(format!(
            "test script {} does not exist",
            args.script.display()
        )));
    }

    let report = TestScript::new(&args.script, probe).report();
    if args.json {
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::serialization(e.to_string()))?;
        reporter.raw(&json);
        return Ok(());
    }

    let show = |p: &Option<std::path::PathBuf>| {
        p.as_ref()
            .map_or_else(|| "none".to_string(), |p| p.display().to_string())
    };
    reporter.raw(&report.script.display().to_string());
    reporter.field("doc", &show(&report.doc));
    reporter.field("data", &show(&report.data));
    reporter.field("requirements", &show(&report.requirements));
    if report.doc_synchronized {
        reporter.success("documentation is up to date");
    } else {
        reporter.failure("documentation is missing or out of date");
    }
    Ok(())
}

/// `config`: print the effective probe configuration
pub fn run_config(probe: &ProbeConfig, reporter: &Reporter, args: &ConfigArgs) -> CliResult<()> {
    let text = match args.format {
        ConfigFormat::Yaml => serde_yaml_ng::to_string(probe)
            .map_err(|e| CliError::serialization(e.to_string()))?,
        ConfigFormat::Json => serde_json::to_string_pretty(probe)
            .map_err(|e| CliError::serialization(e.to_string()))?,
    };
    reporter.raw(&text);
    Ok(())
}
