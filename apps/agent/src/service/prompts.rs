//! Prompt templates for answering questions and generating documents.
//!
//! Placeholders use `{name}` markers filled with simple string replacement.

pub const ANSWER_SYSTEM: &str = "You are a careful assistant answering questions about one \
applicant's career documents. Answer from the provided excerpts only. If the excerpts do not \
contain the answer, say you don't know rather than guessing.";

pub const ANSWER_PROMPT_TEMPLATE: &str = r#"DOCUMENT EXCERPTS:
{context}

{history}QUESTION:
{question}

Answer the question using only the document excerpts above."#;

pub const QUALIFICATIONS_PROMPT_TEMPLATE: &str = r#"Read the job description below and list the qualifications and skills it asks for.

Rules:
- Return at most 8 items.
- Each item is one short phrase naming a single qualification.
- Respond with a JSON array of strings and nothing else, for example:
  ["5+ years of backend development", "experience with PostgreSQL"]

JOB DESCRIPTION:
{job_desc}"#;

pub const SKILL_STATEMENT_SYSTEM: &str = "You write one line of a cover letter in the \
applicant's voice. Ground every claim in the provided excerpt. Respond with a single sentence \
and nothing else.";

pub const SKILL_STATEMENT_PROMPT_TEMPLATE: &str = r#"DOCUMENT EXCERPT:
{context}

QUALIFICATION FROM THE JOB POSTING:
{qualification}

Write one first-person sentence showing how the applicant's experience matches this qualification."#;

pub const CONDENSE_PROMPT_TEMPLATE: &str = r#"Below are draft cover letter statements, one per line.

STATEMENTS:
{statements}

Rewrite them as the strongest possible list:
- The FIRST item must state the applicant's total years of relevant experience.
- Merge overlapping statements and drop the weakest ones.
- Return at most 6 items.
- Respond with a JSON array of strings and nothing else."#;

pub const COMPANY_INTEREST_SYSTEM: &str = "You write the closing line of a cover letter in the \
applicant's voice. Respond with a single sentence and nothing else.";

pub const COMPANY_INTEREST_PROMPT_TEMPLATE: &str = r#"JOB DESCRIPTION:
{job_desc}

Write one first-person sentence explaining why the applicant is excited to work at {company}."#;

pub const RESUME_SYSTEM: &str = "You are an expert resume writer. Use only facts present in the \
provided document excerpts; never invent employers, dates or credentials.";

pub const RESUME_PROMPT_TEMPLATE: &str = r#"Write a resume for {applicant_name}, tailored to the {job_title} role at {company_name}.

JOB DESCRIPTION:
{job_desc}

DOCUMENT EXCERPTS:
{context}

Format the resume as plain text with these sections, in this order:
Summary
Summary of Skills and Experience
Work Experience
Education

Emphasize the experience most relevant to the job description. Respond with the resume text only."#;
