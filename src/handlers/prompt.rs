use crate::config::EscalationRule;

/// Renders the escalation rules as prompt bullet points.
pub fn escalation_instructions(rules: &[EscalationRule]) -> String {
    rules
        .iter()
        .map(|rule| {
            format!(
                "- If the error is with respect to {} then inform the user to contact {} ({}) as it is a limitation. DO NOT include any other information.",
                rule.topic, rule.team, rule.contact
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(error_message: Option<&str>, files_content: &str, rules: &[EscalationRule]) -> String {
    let error_message = error_message.unwrap_or("No error message was reported.");
    let files_content = if files_content.trim().is_empty() {
        "No repository files were provided."
    } else {
        files_content
    };
    let policy = escalation_instructions(rules);
    let alignment = if policy.is_empty() {
        String::new()
    } else {
        format!(" Ensure that the troubleshooting steps are provided aligning to the following rules:\n{policy}")
    };

    format!(
        "<task>
You are an expert in troubleshooting Terraform code issues. Below is an error message and the contents of a Git repository.
Please provide detailed troubleshooting steps to resolve the issue.

<error_message>
{error_message}
</error_message>

<repo_files_content>
{files_content}
</repo_files_content>

<instructions>
Provide step-by-step instructions on how to resolve the error in terraform enterprise environment, taking into account the specific context provided by the repository files.{alignment}
</instructions>
</task>
"
    )
}
