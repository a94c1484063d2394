// All LLM prompt templates for cover letter generation.

use crate::generation::form::CoverLetterForm;

/// System prompt template. Replace `{tone_instructions}` before sending.
pub const SYSTEM_PROMPT_TEMPLATE: &str = "You are a professional cover letter writer. 
Generate a personalized, compelling cover letter based on the provided information.

TONE: {tone_instructions}

The letter should:
- Highlight relevant skills and experience matching the job description
- Show genuine enthusiasm for the role and company
- Be appropriately concise (300-400 words)
- Use standard business letter format
- Start with a formal greeting
- End with a professional closing

Do not include placeholders like [Company Name] or [Your Name] - use the actual information provided.";

/// User prompt template.
/// Replace: {job_title}, {company_name}, {job_description}, {skills},
///          {experience}, {name}, {contact_email}
pub const USER_PROMPT_TEMPLATE: &str = "Write a cover letter for the following position:

Job Details:
- Position: {job_title}
- Company: {company_name}

Job Description:
{job_description}

My Qualifications:
- Skills: {skills}
- Experience: {experience}

Contact Information:
- Name: {name}
- Email: {contact_email}";

pub fn build_system_prompt(form: &CoverLetterForm) -> String {
    SYSTEM_PROMPT_TEMPLATE.replace("{tone_instructions}", form.tone.instructions())
}

/// Fills the user template in a single pass so placeholder-like text typed
/// into one field is never substituted again by a later field.
pub fn build_user_prompt(form: &CoverLetterForm) -> String {
    let skills = form.skills_list().join(", ");
    let values: [(&str, &str); 7] = [
        ("{job_title}", form.job_title.trim()),
        ("{company_name}", form.company_name.trim()),
        ("{job_description}", form.job_description.trim()),
        ("{skills}", &skills),
        ("{experience}", form.experience.trim()),
        ("{name}", form.name.trim()),
        ("{contact_email}", form.contact_email.trim()),
    ];

    let mut out = String::with_capacity(USER_PROMPT_TEMPLATE.len() + 512);
    let mut rest = USER_PROMPT_TEMPLATE;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::form::sample_form;
    use crate::generation::tone::Tone;

    #[test]
    fn test_system_prompt_includes_tone() {
        let mut form = sample_form();
        form.tone = Tone::Creative;
        let prompt = build_system_prompt(&form);
        assert!(prompt.contains(Tone::Creative.instructions()));
        assert!(!prompt.contains("{tone_instructions}"));
    }

    #[test]
    fn test_user_prompt_fills_every_field() {
        let prompt = build_user_prompt(&sample_form());
        assert!(prompt.contains("- Position: Backend Engineer"));
        assert!(prompt.contains("- Company: Analytical Engines Ltd"));
        assert!(prompt.contains("We need someone to scale our ledger service."));
        assert!(prompt.contains("- Skills: Rust, distributed systems, PostgreSQL"));
        assert!(prompt.contains("- Experience: 6 years building payment infrastructure"));
        assert!(prompt.contains("- Name: Ada Lovelace"));
        assert!(prompt.contains("- Email: ada@example.com"));
        assert!(!prompt.contains("{job_title}"));
    }

    #[test]
    fn test_user_prompt_does_not_expand_placeholders_in_input() {
        let mut form = sample_form();
        form.job_description = "Mention {name} and {curly} braces".to_string();
        let prompt = build_user_prompt(&form);
        assert!(prompt.contains("Mention {name} and {curly} braces"));
    }
}
