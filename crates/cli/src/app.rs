use crate::command;
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub enum RunCmd {
    /// Start the HTTP server.
    #[clap(name = "serve")]
    Serve(command::serve::Serve),
    /// Render a markdown file to an HTML fragment.
    #[clap(name = "render")]
    Render(command::render::Render),
    /// Export a markdown file to PDF.
    #[clap(name = "export")]
    Export(command::export::Export),
    /// Live preview of a markdown file edited elsewhere.
    #[clap(name = "watch")]
    Watch(command::watch::Watch),
    /// List the PDF themes.
    #[clap(name = "themes")]
    Themes(command::themes::Themes),
    /// Show or change the UI theme.
    #[clap(name = "theme", subcommand)]
    Theme(command::theme::Theme),
}

/// mdpress CLI arguments.
#[derive(Parser, Debug)]
pub struct Args {
    /// Enable the logging system.
    #[clap(long)]
    pub log: Option<PathBuf>,

    /// Specify the path of the config file.
    #[clap(long)]
    pub config_file: Option<PathBuf>,
}

impl RunCmd {
    pub async fn run(self, args: Args) -> Result<()> {
        let (config, config_err) = mdpress_config::load_config_on_startup(args.config_file);

        let log_file = crate::logging::log_path(args.log, &config.log);
        let _guard = crate::logging::init(log_file, &config.log)?;

        if let Some(err) = config_err {
            tracing::warn!(?err, "Invalid config file, using the default config");
            eprintln!(
                "warning: ignoring invalid config file {:?}: {err}",
                mdpress_config::config_file()
            );
        }

        match self {
            Self::Serve(serve) => serve.run(config).await,
            Self::Render(render) => render.run(),
            Self::Export(export) => export.run(config).await,
            Self::Watch(watch) => watch.run(config).await,
            Self::Themes(themes) => themes.run(config),
            Self::Theme(theme) => theme.run(),
        }
    }
}
