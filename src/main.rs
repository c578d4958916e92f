use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{command, value_parser, Arg, Command};

mod clone_repos;
mod repo_list;

use clone_repos::{clone_all, Config, GitCli};

fn cli() -> Command {
    command!()
        .arg(
            Arg::new("LIST")
                .required(false)
                .help("The file listing one repository per line")
                .default_value("repos.txt"),
        )
        .arg(
            Arg::new("PATH")
                .required(false)
                .help("The directory to clone into")
                .default_value("cloned_repos"),
        )
        .arg(
            Arg::new("tasks")
                .short('t')
                .long("tasks")
                .help("The maximum number of clones running at once")
                .value_parser(value_parser!(u16).range(1..))
                .default_value("20"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = cli().get_matches();
    let list = matches.get_one::<String>("LIST").unwrap();
    let path = matches.get_one::<String>("PATH").unwrap();
    let tasks = *matches.get_one::<u16>("tasks").unwrap();

    std::fs::create_dir_all(path)
        .with_context(|| format!("Couldn't create clone directory {path}"))?;

    let urls = repo_list::read_repo_list(Path::new(list))?;

    let config = Config {
        clone_dir: PathBuf::from(path),
        max_tasks: usize::from(tasks),
    };
    clone_all(urls, config, Arc::new(GitCli)).await;

    Ok(())
}
