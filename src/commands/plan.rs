//! Implementation of the `shellforge plan` command.

use super::variant_profile;
use crate::build::naming;
use crate::cli::PlanArgs;
use crate::config::Config;
use crate::error::{ForgeError, Result};
use crate::planner::{self, ConfigurationPlan};
use crate::platform::PlatformProfile;
use crate::profile::BuildProfile;
use serde::Serialize;

/// What `plan` reports, in both text and JSON form.
#[derive(Debug, Serialize)]
struct PlanReport<'a> {
    platform: String,
    shell_name: String,
    command_line: String,
    #[serde(flatten)]
    plan: &'a ConfigurationPlan,
}

impl<'a> PlanReport<'a> {
    fn new(profile: &BuildProfile, plan: &'a ConfigurationPlan) -> Self {
        Self {
            platform: profile.platform.to_string(),
            shell_name: naming::shell_name(
                profile.width,
                profile.mode,
                plan.memcheck,
                None,
                &profile.platform,
            ),
            command_line: plan.command_line(),
            plan,
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Platform:   {}\n", self.platform));
        out.push_str(&format!("Shell name: {}\n", self.shell_name));
        out.push_str(&format!("Configure:  {}\n", self.command_line));
        if self.plan.env.is_empty() {
            out.push_str("Environment: (inherited)\n");
        } else {
            out.push_str("Environment:\n");
            for (key, value) in &self.plan.env {
                out.push_str(&format!("  {}={}\n", key, value));
            }
        }
        out
    }
}

/// Execute the `shellforge plan` command.
pub fn cmd_plan(args: PlanArgs) -> Result<()> {
    let config = Config::load_or_default(args.variant.config.as_deref())?;
    let platform = PlatformProfile::detect()?;
    let profile = variant_profile(&args.variant, &config, platform);

    let plan = planner::plan(&profile, &args.configure)?;
    let report = PlanReport::new(&profile, &plan);

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(|e| {
            ForgeError::UserError(format!("failed to serialize plan to JSON: {}", e))
        })?;
        println!("{}", json);
    } else {
        print!("{}", report.render_text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{CpuArch, HostOs};
    use crate::profile::{BuildMode, WordWidth};
    use std::path::Path;

    fn linux_profile(mode: BuildMode) -> BuildProfile {
        let platform = PlatformProfile::new(HostOs::Linux, CpuArch::X86_64, None, "box");
        BuildProfile::new(WordWidth::W64, mode, false, platform)
    }

    #[test]
    fn test_text_report_lists_name_and_command() {
        let profile = linux_profile(BuildMode::Optimized);
        let plan = planner::plan(&profile, Path::new("/src/js/src/configure")).unwrap();
        let text = PlanReport::new(&profile, &plan).render_text();

        assert!(text.contains("Shell name: js-opt-64-vg-linux"));
        assert!(text.contains("Configure:  sh /src/js/src/configure"));
        assert!(text.contains("--enable-optimize"));
        assert!(text.contains("Environment: (inherited)"));
    }

    #[test]
    fn test_text_report_lists_env_overrides() {
        let platform = PlatformProfile::new(HostOs::Linux, CpuArch::X86_64, None, "box");
        let profile = BuildProfile::new(WordWidth::W32, BuildMode::Debug, false, platform);
        let plan = planner::plan(&profile, Path::new("/src/js/src/configure")).unwrap();
        let text = PlanReport::new(&profile, &plan).render_text();

        assert!(text.contains("Environment:\n"));
        assert!(text.contains("  CC=gcc -m32\n"));
    }

    #[test]
    fn test_json_report_flattens_plan() {
        let profile = linux_profile(BuildMode::Debug);
        let plan = planner::plan(&profile, Path::new("/src/js/src/configure")).unwrap();
        let json = serde_json::to_value(PlanReport::new(&profile, &plan)).unwrap();

        assert_eq!(json["shell_name"], "js-dbg-64-vg-linux");
        assert_eq!(json["memcheck"], true);
        assert!(json["args"].as_array().unwrap().len() > 2);
        assert!(json["env"].as_object().unwrap().is_empty());
    }
}
