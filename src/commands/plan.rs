//! Plan command implementation

use crate::cli::FlashArgs;
use crate::config::Config;
use fwflash_seq::plan_invocations;

/// Print the commands a flash would run, in order
pub fn cmd_plan(config: &Config, args: &FlashArgs) -> Result<(), Box<dyn std::error::Error>> {
    let tools = config.tool_environment(args);
    let request = config.flash_request(args);

    let invocations = plan_invocations(&tools, &request)?;
    for (i, (stage, invocation)) in invocations.iter().enumerate() {
        println!("{}. {} write", i + 1, stage);
        println!("   {}", invocation);
    }

    Ok(())
}
