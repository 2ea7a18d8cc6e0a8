use anyhow::Result;

use crate::Context;
use crate::paths;
use crate::schema::PolicyFile;
use crate::ui;

pub fn run(ctx: &Context, policy: Option<&str>) -> Result<()> {
    let path = paths::policy_path(policy)?;
    let file = PolicyFile::load(&path)?;
    let policies = file.compile()?;

    if !ctx.quiet {
        ui::header(&path.display().to_string());
        for policy in &policies {
            let filters: Vec<_> = policy.filters.iter().map(|f| f.name()).collect();
            let actions: Vec<_> = policy.actions.iter().map(|a| a.name()).collect();
            ui::kv(
                &policy.name,
                &format!(
                    "filters [{}] actions [{}]",
                    filters.join(", "),
                    actions.join(", ")
                ),
            );
        }
        println!();
    }
    ui::success(&format!("{} policies valid", policies.len()));
    Ok(())
}
