//! Next-step scripts printed for each terminal outcome
//!
//! The monitor never tags or pushes. These lines hand that job to the operator.

use crate::models::config::MonitorConfig;
use crate::models::status::FailedTest;

fn cd_line(config: &MonitorConfig) -> Option<String> {
    if config.working_dir.as_os_str().is_empty() {
        None
    } else {
        Some(format!("cd {}", config.working_dir.display()))
    }
}

fn tag_name(config: &MonitorConfig) -> String {
    format!("v{}", config.version)
}

fn tag_lines(config: &MonitorConfig) -> Vec<String> {
    let tag = tag_name(config);
    let message = if config.commit_message.is_empty() {
        format!("Release {}", config.version)
    } else {
        config.commit_message.clone()
    };
    let mut lines: Vec<String> = cd_line(config).into_iter().collect();
    lines.push(format!("git tag -a {} -m {:?}", tag, message));
    lines.push("git push".to_string());
    lines.push(format!("git push origin {}", tag));
    lines
}

/// All tests passed: the version may now be tagged
pub fn success_steps(config: &MonitorConfig) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} passed all remote tests. Create the release tag and push:",
        config.slug, config.version
    )];
    lines.extend(tag_lines(config).into_iter().map(|l| format!("  {}", l)));
    lines
}

/// A test failed: fix, amend, rebuild and redeploy without tagging
pub fn failure_steps(config: &MonitorConfig, failed: &[FailedTest]) -> Vec<String> {
    let mut lines = vec![format!(
        "{} {} failed remote tests. No tag was created.",
        config.slug, config.version
    )];
    for test in failed {
        match &test.url {
            Some(url) => lines.push(format!("  - {} ({}): {}", test.test_type, test.status, url)),
            None => lines.push(format!("  - {} ({})", test.test_type, test.status)),
        }
    }
    lines.push("To recover:".to_string());
    if let Some(cd) = cd_line(config) {
        lines.push(format!("  {}", cd));
    }
    lines.push("  # fix the reported issues, then amend the release commit".to_string());
    lines.push("  git add -A && git commit --amend --no-edit".to_string());
    lines.push("  # rebuild the package, then redeploy the existing build".to_string());
    lines.push("  deploy --skip-build".to_string());
    lines
}

/// Attempt ceiling reached: state unknown, check by hand
pub fn timeout_steps(config: &MonitorConfig, attempts: u32) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} {}: tests did not finish after {} status checks.",
            config.slug, config.version, attempts
        ),
        format!(
            "Check the deployment status for product {} manually.",
            config.product_id
        ),
        "If it succeeded, tag and push by hand:".to_string(),
    ];
    lines.extend(tag_lines(config).into_iter().map(|l| format!("  {}", l)));
    lines
}

/// Credentials rejected: nothing will succeed until they are fixed
pub fn auth_error_steps(config: &MonitorConfig, error: &str) -> Vec<String> {
    vec![
        format!(
            "{} {}: the submission API rejected the credentials ({}).",
            config.slug, config.version, error
        ),
        format!(
            "Update the username/password for {} and restart monitoring.",
            config.credentials.api_url
        ),
        "No tag was created.".to_string(),
    ]
}
