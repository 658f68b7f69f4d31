use super::{json_pretty, EXIT_SUCCESS};
use clap::{Command, CommandFactory};
use std::path::{Path, PathBuf};

/// Write `massval.1` plus one page per subcommand (`massval-validate.1`, ...).
pub fn run<C: CommandFactory>(dir: &Path, json: bool) -> Result<u8, String> {
    std::fs::create_dir_all(dir).map_err(|e| format!("failed to create dir: {e}"))?;
    let cmd = C::command();
    let bin = cmd.get_name().to_owned();

    let mut written = vec![write_page(dir, &bin, cmd.clone())?];
    for sub in cmd.get_subcommands() {
        let name = format!("{bin}-{}", sub.get_name());
        written.push(write_page(dir, &name, sub.clone())?);
    }

    if json {
        println!("{}", json_pretty(&written)?);
    } else {
        println!("{} man pages written to {}", written.len(), dir.display());
    }
    Ok(EXIT_SUCCESS)
}

fn write_page(dir: &Path, name: &str, cmd: Command) -> Result<PathBuf, String> {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd)
        .render(&mut buf)
        .map_err(|e| format!("man page render failed: {e}"))?;
    let path = dir.join(format!("{name}.1"));
    std::fs::write(&path, &buf).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    Ok(path)
}
