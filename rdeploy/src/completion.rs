use std::io::Write;

use anyhow::Result;
use clap::{Args, Command};
use clap_complete::{generate, Shell};

const BIN_NAME: &str = "rdeploy";

#[derive(Args)]
pub struct Arg {
    /// Type of shell
    #[clap(arg_enum)]
    shell: Shell,
}

impl Arg {
    /// Write the completion script for the chosen shell to `buf`.
    pub fn handle(&self, app: &mut Command<'_>, buf: &mut dyn Write) -> Result<()> {
        generate(self.shell, app, BIN_NAME, buf);
        Ok(())
    }
}
