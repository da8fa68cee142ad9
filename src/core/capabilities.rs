//! One-shot capabilities: a task prompt over workspace documents and a
//! single completion call, no conversation state.

use std::fmt;
use std::str::FromStr;
use tracing::info;

use crate::core::llm::ChatBackend;
use crate::core::prompts;
use crate::error::{Result, WorkspaceError};
use crate::models::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Optimize,
    CoverLetter,
    Summarize,
    Recommend,
    Filters,
    Contact,
}

impl Capability {
    pub fn all() -> [Capability; 6] {
        [
            Capability::Optimize,
            Capability::CoverLetter,
            Capability::Summarize,
            Capability::Recommend,
            Capability::Filters,
            Capability::Contact,
        ]
    }

    /// Command and route name
    pub fn name(&self) -> &'static str {
        match self {
            Capability::Optimize => "optimize",
            Capability::CoverLetter => "cover-letter",
            Capability::Summarize => "summarize",
            Capability::Recommend => "recommend",
            Capability::Filters => "filters",
            Capability::Contact => "contact",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Capability::Optimize => "Optimize the resume for the job description",
            Capability::CoverLetter => "Write a cover letter for the job description",
            Capability::Summarize => "Summarize the resume without personal data",
            Capability::Recommend => "Write a recommendation letter for the candidate",
            Capability::Filters => "Derive recruiting-site filters and an SQL insert from the resume",
            Capability::Contact => "Extract contact details from the job description",
        }
    }

    pub fn needs_resume(&self) -> bool {
        !matches!(self, Capability::Contact)
    }

    pub fn needs_jd(&self) -> bool {
        matches!(
            self,
            Capability::Optimize | Capability::CoverLetter | Capability::Recommend | Capability::Contact
        )
    }

    /// Task prompt; a required document that is absent is an error
    pub fn prompt(&self, resume: Option<&str>, jd: Option<&str>) -> Result<String> {
        let resume = resume.filter(|r| !r.trim().is_empty());
        let jd = jd.filter(|j| !j.trim().is_empty());

        let need_resume = || resume.ok_or(WorkspaceError::MissingDocument("resume"));
        let need_jd = || jd.ok_or(WorkspaceError::MissingDocument("job description"));

        let prompt = match self {
            Capability::Optimize => prompts::optimize_prompt(need_jd()?, need_resume()?),
            Capability::CoverLetter => prompts::cover_letter_prompt(need_jd()?, need_resume()?),
            Capability::Summarize => prompts::summarize_prompt(need_resume()?),
            Capability::Recommend => prompts::recommendation_prompt(need_jd()?, need_resume()?),
            Capability::Filters => prompts::filters_prompt(need_resume()?),
            Capability::Contact => prompts::contact_prompt(need_jd()?),
        };
        Ok(prompt)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Capability {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('/').to_lowercase().replace('_', "-");
        Capability::all()
            .into_iter()
            .find(|c| c.name() == wanted)
            .ok_or_else(|| format!("Unknown capability: {}", s))
    }
}

/// Run one capability against the backend
pub async fn run_capability(
    capability: Capability,
    backend: &dyn ChatBackend,
    model: &str,
    temperature: f32,
    resume: Option<&str>,
    jd: Option<&str>,
) -> Result<String> {
    let prompt = capability.prompt(resume, jd)?;
    info!("Running {} with {}", capability, model);
    let reply = backend
        .complete(model, &[ChatMessage::user(prompt)], temperature)
        .await?;
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AirecruitError, LlmError};
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct Recorder(Mutex<Vec<String>>);

    #[async_trait]
    impl ChatBackend for Recorder {
        async fn complete(
            &self,
            _model: &str,
            messages: &[ChatMessage],
            _temperature: f32,
        ) -> std::result::Result<String, LlmError> {
            self.0.lock().unwrap().push(messages[0].content.clone());
            Ok("done".to_string())
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("cover_letter".parse::<Capability>().unwrap(), Capability::CoverLetter);
        assert_eq!("/Optimize".parse::<Capability>().unwrap(), Capability::Optimize);
        assert!("translate".parse::<Capability>().is_err());
    }

    #[test]
    fn test_missing_inputs_reported() {
        let err = Capability::Optimize.prompt(Some("cv"), None).unwrap_err();
        assert!(matches!(
            err,
            AirecruitError::Workspace(WorkspaceError::MissingDocument("job description"))
        ));
        assert!(Capability::Contact.prompt(None, Some("jd")).is_ok());
        assert!(Capability::Summarize.prompt(Some(" "), None).is_err());
    }

    #[tokio::test]
    async fn test_run_sends_single_user_message() {
        let backend = Recorder(Mutex::new(Vec::new()));
        let reply = run_capability(Capability::Summarize, &backend, "gpt-4", 0.3, Some("Jane CV"), None)
            .await
            .unwrap();
        assert_eq!(reply, "done");
        let sent = backend.0.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].contains("Jane CV"));
    }

    #[tokio::test]
    async fn test_missing_input_never_calls_backend() {
        let backend = Recorder(Mutex::new(Vec::new()));
        let result = run_capability(Capability::Recommend, &backend, "gpt-4", 0.3, None, Some("jd")).await;
        assert!(result.is_err());
        assert!(backend.0.lock().unwrap().is_empty());
    }
}
