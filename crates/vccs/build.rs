use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;

// The argument definitions need nothing beyond the build-dependencies.
#[path = "src/cli.rs"]
mod cli;

fn main() -> io::Result<()> {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::other("OUT_DIR is unset"))?;
    let man_dir = out_dir.join("man");
    std::fs::create_dir_all(&man_dir)?;

    write_manpages(cli::Cli::command(), &man_dir)
}

/// One page per command; hidden subcommands get none. Subcommand pages are
/// named `vccs-<sub>.1` so `man vccs-dial` finds them.
fn write_manpages(root: clap::Command, dir: &Path) -> io::Result<()> {
    let mut pending = vec![root];
    while let Some(cmd) = pending.pop() {
        let name = cmd.get_name().to_owned();
        pending.extend(
            cmd.get_subcommands()
                .filter(|sub| !sub.is_hide_set())
                .map(|sub| sub.clone().name(format!("{name}-{}", sub.get_name()))),
        );

        let mut page = Vec::new();
        clap_mangen::Man::new(cmd).render(&mut page)?;
        std::fs::write(dir.join(format!("{name}.1")), page)?;
    }
    Ok(())
}
