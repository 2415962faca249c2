use clap::Parser;
use cli::{Args, RunCmd};

#[derive(Parser, Debug)]
pub enum Cmd {
    /// Display the current version.
    #[clap(name = "version")]
    Version,

    /// Run mdpress.
    #[clap(flatten)]
    Run(Box<RunCmd>),
}

#[derive(Parser, Debug)]
#[clap(name = "mdpress", disable_version_flag = true)]
pub struct Mdpress {
    #[clap(flatten)]
    pub args: Args,

    #[clap(subcommand)]
    pub cmd: Cmd,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mdpress = Mdpress::parse();

    match mdpress.cmd {
        Cmd::Version => {
            println!("mdpress {}", env!("CARGO_PKG_VERSION"));
        }
        Cmd::Run(run_cmd) => {
            if let Err(e) = run_cmd.run(mdpress.args).await {
                eprintln!("error: {e:?}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
