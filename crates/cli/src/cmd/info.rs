use anyhow::Result;

use targetdiff_lib::consts::APP_NAME;

use super::{GlobalArgs, Session};
use crate::output::{OutputFormat, print_json, print_stat};

pub fn cmd_info(global: &GlobalArgs, format: OutputFormat) -> Result<()> {
  let session = Session::open(global)?;
  let paths = &session.paths;

  if format.is_json() {
    let info = serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "workspace_root": paths.workspace_root,
      "execution_root": paths.execution_root,
      "output_root": paths.output_root,
    });
    return print_json(&info);
  }

  println!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));
  print_stat("Workspace", &paths.workspace_root.display().to_string());
  print_stat("Execution root", &paths.execution_root.display().to_string());
  print_stat("Output root", &paths.output_root.display().to_string());

  Ok(())
}
