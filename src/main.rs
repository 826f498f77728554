use clap::Parser;
use env_logger::{Builder, Env, Target};
use krigrid::{run, Args};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "info" } else { "warn" };
    let env = Env::new().filter_or("KRIGRID_LOG", level);
    let mut builder = Builder::from_env(env);
    // keep stdout for the grid unless it is written to a file
    let target = if args.output.is_some() {
        Target::Stdout
    } else {
        Target::Stderr
    };
    builder.target(target).try_init().ok();

    run(&args)?;
    Ok(())
}
