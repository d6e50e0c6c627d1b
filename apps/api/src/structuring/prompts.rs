use crate::llm_client::prompts::NO_INVENTION_INSTRUCTION;

pub fn build_structure_prompt(resume_text: &str) -> String {
    format!(
        r#"You are a professional résumé parser. Read the résumé text below and extract its structured content.

RÉSUMÉ TEXT:
{resume_text}

Return JSON with exactly this shape. All four top-level keys must be present:
{{
  "personal_info": {{
    "name": "full name (required)",
    "email": "email address",
    "phone": "phone number or null",
    "location": "city / region or null",
    "summary": "profile or objective, or null",
    "linkedin": "LinkedIn URL or null",
    "github": "GitHub URL or null",
    "website": "personal website or null"
  }},
  "work_experience": [
    {{
      "company": "company name",
      "position": "job title",
      "start_date": "YYYY-MM",
      "end_date": "YYYY-MM, or null if this is the current job",
      "description": ["responsibility or achievement", "..."],
      "technologies": ["technology", "..."]
    }}
  ],
  "education": [
    {{
      "institution": "school name",
      "degree": "degree (e.g. BSc, MSc, PhD)",
      "major": "field of study or null",
      "start_date": "YYYY-MM",
      "end_date": "YYYY-MM or null",
      "gpa": "GPA or null"
    }}
  ],
  "skills": [
    {{
      "category": "technical | soft | language",
      "name": "skill name",
      "level": "beginner | intermediate | advanced | expert, or null"
    }}
  ]
}}

Rules:
1. List work experience in reverse chronological order.
2. Pull skills from the skills section and from project or job descriptions, and categorise each one.
3. Normalise every date to YYYY-MM where the text allows it.
4. {NO_INVENTION_INSTRUCTION}"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_text_and_required_sections() {
        let prompt = build_structure_prompt("Ada Lovelace\nada@example.com");
        assert!(prompt.contains("Ada Lovelace\nada@example.com"));
        for section in ["personal_info", "work_experience", "education", "skills"] {
            assert!(prompt.contains(section), "missing {section}");
        }
    }
}
