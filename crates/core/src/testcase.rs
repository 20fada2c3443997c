//! Test case records and the model-output contract
//!
//! Builds the prompt sent to the generation collaborator and turns its raw
//! text response back into [`TestCase`] records.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON keys the model must produce for every test case, in column order.
pub const REQUIRED_FIELDS: [&str; 5] = [
    "Test Case ID",
    "Test Case Title",
    "Steps",
    "Expected Result",
    "Linked Acceptance Criterion",
];

/// One verification scenario produced from a user story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: String,
    pub title: String,
    pub steps: String,
    pub expected_result: String,
    pub acceptance_criteria: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse JSON response: {0}")]
    InvalidJson(String),

    #[error("No test cases were generated")]
    Empty,

    #[error("Test case {0} is not a valid object")]
    NotAnObject(usize),

    #[error("Test case {index} is missing fields: {}", missing.join(", "))]
    MissingFields { index: usize, missing: Vec<String> },
}

/// Build the generation prompt for a user story.
pub fn build_prompt(user_story: &str) -> String {
    format!(
        r#"You are a professional SDET. Generate test cases for the following user story.

User Story:
{user_story}

Generate a comprehensive set of test cases covering all acceptance criteria.

IMPORTANT: Return ONLY a valid JSON array with no additional text, explanations, or markdown formatting.

Each test case must have these EXACT field names:
- "Test Case ID" (format: TC001, TC002, etc.)
- "Test Case Title" (brief description)
- "Steps" (numbered steps separated by \n)
- "Expected Result" (what should happen)
- "Linked Acceptance Criterion" (e.g., AC1, AC2, etc.)

Example format:
[
  {{
    "Test Case ID": "TC001",
    "Test Case Title": "Successful login with valid credentials",
    "Steps": "1. Navigate to login page\n2. Enter valid email\n3. Enter valid password\n4. Click Login button",
    "Expected Result": "User is successfully logged in and redirected to dashboard",
    "Linked Acceptance Criterion": "AC1"
  }}
]

Generate the JSON array now:"#
    )
}

/// Strip markdown code fences from a model response.
///
/// Every line that starts with three backticks is dropped, which removes both
/// ```` ```json ```` openers and closing fences.
pub fn clean_response(response: &str) -> String {
    let trimmed = response.trim();

    if !trimmed.starts_with("```") {
        return trimmed.to_string();
    }

    trimmed
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Parse a raw model response into test cases.
///
/// A bare object is accepted as a single test case. Field values that are not
/// strings are kept as their JSON text.
pub fn parse_test_cases(response: &str) -> Result<Vec<TestCase>, ParseError> {
    let cleaned = clean_response(response);
    let value: Value =
        serde_json::from_str(&cleaned).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    if items.is_empty() {
        return Err(ParseError::Empty);
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| to_test_case(i + 1, item))
        .collect()
}

fn to_test_case(index: usize, item: &Value) -> Result<TestCase, ParseError> {
    let object = item.as_object().ok_or(ParseError::NotAnObject(index))?;

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .filter(|field| !object.contains_key(**field))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ParseError::MissingFields { index, missing });
    }

    let field = |name: &str| match &object[name] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };

    Ok(TestCase {
        id: field(REQUIRED_FIELDS[0]),
        title: field(REQUIRED_FIELDS[1]),
        steps: field(REQUIRED_FIELDS[2]),
        expected_result: field(REQUIRED_FIELDS[3]),
        acceptance_criteria: field(REQUIRED_FIELDS[4]),
    })
}
