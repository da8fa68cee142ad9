//! System and task prompts.
//!
//! The system prompt sets the persona, embeds the workspace documents and
//! documents the directive format. Its action list is rendered from the
//! [`ActionRegistry`] so the model is only ever told about actions the
//! dispatcher can resolve.

use std::fmt::Write;

use crate::core::actions::ActionRegistry;
use crate::core::directive::UNRESOLVED_MARKER;
use crate::models::Mode;

/// Shown in place of the resume when none is classified or readable
pub const NO_RESUME: &str = "(no resume in the workspace)";

/// Shown in place of the job description when none is classified or readable
pub const NO_JD: &str = "(no job description in the workspace)";

const CANDIDATE_PERSONA: &str = r#"You are a recruiting assistant working for a job seeker. You help them optimize their resume for a job description, write a cover letter and email it to the employer. If a request has nothing to do with this, steer the user back to these tasks."#;

const HUNTER_PERSONA: &str = r#"You are a recruiting assistant working for a headhunter. You help them optimize a candidate's resume for a client's job description, write a recommendation letter and email it to the hiring contact. If a request has nothing to do with recruiting, steer the user back to recruiting."#;

const CANDIDATE_RULES: &str = r#"1. Base all work on the resume and job description above. If either is missing, ask the user to add it with /file.
2. Reply in Markdown.
3. After optimizing the resume, ask whether to export it to PDF.
4. A cover letter summarizes the resume against the job description, highlights the fit and stays concise. Afterwards ask whether to email it.
5. Only when the user confirms (for example "ok", "yes", "go ahead") include a local action in your reply."#;

const HUNTER_RULES: &str = r#"1. Base all work on the candidate resume and job description above. If either is missing, ask the user to add it with /file.
2. Reply in Markdown.
3. After optimizing the candidate resume, ask whether to export it to PDF.
4. A recommendation letter presents the candidate's fit for the role to the hiring contact. Afterwards ask whether to email it.
5. Only when the user confirms include a local action in your reply."#;

fn document_block(title: &str, content: Option<&str>, absent: &str) -> String {
    match content {
        Some(text) if !text.trim().is_empty() => {
            format!("### {}\n<<<BEGIN\n{}\nEND>>>\n", title, text.trim_end())
        }
        _ => format!("### {}\n{}\n", title, absent),
    }
}

/// Render the local-action section from the registry
pub fn render_action_section(mode: Mode, registry: &ActionRegistry) -> String {
    let mut out = String::new();
    out.push_str("## Local actions\n\n");
    out.push_str("To run a local action, include exactly one fenced block in your reply:\n\n");
    out.push_str("```json\n{\"action\": \"<action name>\", \"<param>\": \"<value>\"}\n```\n\n");
    let _ = writeln!(
        out,
        "Every parameter listed for the action must be present. If you cannot determine a value, use the string \"{}\" instead of guessing; the user will be asked for it.\n",
        UNRESOLVED_MARKER
    );
    out.push_str("Available actions:\n");

    for (i, action) in registry.iter().enumerate() {
        let _ = writeln!(out, "\n{}. `{}`: {}", i + 1, action.name(), action.summary(mode));
        for param in action.params(mode) {
            let _ = writeln!(out, "   - `{}`: {}", param.name, param.hint);
        }
    }
    out
}

/// Build the system message for a work session.
///
/// Deterministic in its inputs. Absent documents are replaced with an
/// explicit marker rather than omitted.
pub fn build_system_prompt(
    mode: Mode,
    resume: Option<&str>,
    jd: Option<&str>,
    registry: &ActionRegistry,
) -> String {
    let (persona, rules, resume_title) = match mode {
        Mode::Candidate => (CANDIDATE_PERSONA, CANDIDATE_RULES, "Resume"),
        Mode::Hunter => (HUNTER_PERSONA, HUNTER_RULES, "Candidate resume"),
    };

    let mut prompt = String::new();
    let _ = writeln!(prompt, "{}\n", persona);
    prompt.push_str("## Workspace\n\n");
    prompt.push_str(&document_block(resume_title, resume, NO_RESUME));
    prompt.push('\n');
    prompt.push_str(&document_block("Job description", jd, NO_JD));
    let _ = writeln!(prompt, "\n## How to work\n\n{}\n", rules);
    prompt.push_str(&render_action_section(mode, registry));
    prompt
}

/// Rewrite a resume to fit a job description
pub fn optimize_prompt(jd: &str, resume: &str) -> String {
    format!(
        "Optimize the following resume so it fits the job description better. Keep every fact truthful and answer in Markdown.\n\nJob description:\n{}\n\nCurrent resume:\n{}",
        jd, resume
    )
}

pub fn cover_letter_prompt(jd: &str, resume: &str) -> String {
    format!(
        "Write a concise cover letter for the job description below, based on the resume.\n\nJob description:\n{}\n\nResume:\n{}",
        jd, resume
    )
}

/// Summary safe to share: personal data removed
pub fn summarize_prompt(resume: &str) -> String {
    format!(
        "Summarize the following resume. Hide sensitive information such as the name and contact details.\n\n{}",
        resume
    )
}

pub fn recommendation_prompt(jd: &str, resume: &str) -> String {
    format!(
        "Write a recommendation letter presenting this candidate for the job description below.\n\nJob description:\n{}\n\nCandidate resume:\n{}",
        jd, resume
    )
}

pub fn filters_prompt(resume: &str) -> String {
    format!(
        "Derive search filters for recruiting sites (city, years of experience, salary range, skills, education) from the resume below, then write an SQL INSERT statement storing them.\n\n{}",
        resume
    )
}

pub fn contact_prompt(jd: &str) -> String {
    format!(
        "Extract the contact email address and any other contact details from this job description. Answer \"none found\" if there are none.\n\n{}",
        jd
    )
}
