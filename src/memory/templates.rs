//! Built-in entry templates for recurring security findings.
//!
//! Template text carries `[PLACEHOLDER]` markers. Replacement keys are matched
//! case-insensitively by upper-casing them, so `component` fills `[COMPONENT]`.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::memory::store::create_entry;
use crate::memory::types::{Category, ContentType, CreateEntryRequest, MemoryEntry};

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SecurityTemplate {
    pub name: &'static str,
    /// Template family, e.g. `vulnerability` or `tool`.
    pub group: &'static str,
    pub title: &'static str,
    pub content: &'static str,
    pub category: Category,
    pub priority: i32,
    pub confidence: f64,
    pub tags: &'static [&'static str],
    pub source: &'static str,
}

pub const TEMPLATES: &[SecurityTemplate] = &[
    SecurityTemplate {
        name: "sql_injection",
        group: "vulnerability",
        title: "SQL Injection Vulnerability",
        content: "SQL injection vulnerability found in [COMPONENT]. The [PARAMETER] parameter is \
                  directly concatenated into SQL queries without proper sanitization, allowing \
                  attackers to execute arbitrary SQL commands.",
        category: Category::Vulnerability,
        priority: 9,
        confidence: 0.9,
        tags: &["sql-injection", "injection", "critical", "owasp-top10"],
        source: "security-assessment",
    },
    SecurityTemplate {
        name: "xss",
        group: "vulnerability",
        title: "Cross-Site Scripting (XSS) Vulnerability",
        content: "Cross-site scripting vulnerability found in [COMPONENT]. User input is not \
                  properly encoded before being displayed, allowing attackers to inject malicious \
                  scripts that execute in other users' browsers.",
        category: Category::Vulnerability,
        priority: 8,
        confidence: 0.85,
        tags: &["xss", "injection", "owasp-top10"],
        source: "security-assessment",
    },
    SecurityTemplate {
        name: "authentication_bypass",
        group: "vulnerability",
        title: "Authentication Bypass Vulnerability",
        content: "Authentication bypass vulnerability found in [COMPONENT]. The authentication \
                  mechanism can be circumvented through [METHOD], allowing unauthorized access to \
                  protected resources.",
        category: Category::Vulnerability,
        priority: 10,
        confidence: 0.95,
        tags: &["authentication", "bypass", "critical", "owasp-top10"],
        source: "security-assessment",
    },
    SecurityTemplate {
        name: "privilege_escalation",
        group: "vulnerability",
        title: "Privilege Escalation Vulnerability",
        content: "Privilege escalation vulnerability found in [COMPONENT]. Users can elevate their \
                  privileges through [METHOD], gaining access to functionality or data they should \
                  not have access to.",
        category: Category::Vulnerability,
        priority: 9,
        confidence: 0.9,
        tags: &["privilege-escalation", "authorization", "critical"],
        source: "security-assessment",
    },
    SecurityTemplate {
        name: "sql_injection_exploit",
        group: "exploit",
        title: "SQL Injection Exploit",
        content: "Exploit for SQL injection vulnerability in [COMPONENT]. Payload: [PAYLOAD]. \
                  This exploit can be used to [IMPACT].",
        category: Category::Exploit,
        priority: 8,
        confidence: 0.9,
        tags: &["sql-injection", "exploit", "payload"],
        source: "exploit-development",
    },
    SecurityTemplate {
        name: "xss_exploit",
        group: "exploit",
        title: "XSS Exploit",
        content: "Exploit for XSS vulnerability in [COMPONENT]. Payload: [PAYLOAD]. This exploit \
                  can be used to [IMPACT].",
        category: Category::Exploit,
        priority: 7,
        confidence: 0.85,
        tags: &["xss", "exploit", "payload"],
        source: "exploit-development",
    },
    SecurityTemplate {
        name: "reconnaissance",
        group: "technique",
        title: "Reconnaissance Technique",
        content: "Reconnaissance technique used to gather information about [TARGET]. Method: \
                  [METHOD]. Information gathered: [INFORMATION].",
        category: Category::Technique,
        priority: 5,
        confidence: 0.8,
        tags: &["reconnaissance", "information-gathering"],
        source: "penetration-testing",
    },
    SecurityTemplate {
        name: "enumeration",
        group: "technique",
        title: "Enumeration Technique",
        content: "Enumeration technique used to discover [TARGET]. Method: [METHOD]. Results: \
                  [RESULTS].",
        category: Category::Technique,
        priority: 6,
        confidence: 0.8,
        tags: &["enumeration", "discovery"],
        source: "penetration-testing",
    },
    SecurityTemplate {
        name: "vulnerability_scanner",
        group: "tool",
        title: "Vulnerability Scanner Tool",
        content: "Used [TOOL] to scan [TARGET] for vulnerabilities. Configuration: [CONFIG]. \
                  Results: [RESULTS].",
        category: Category::Tool,
        priority: 6,
        confidence: 0.8,
        tags: &["vulnerability-scanner", "automated-testing"],
        source: "security-assessment",
    },
    SecurityTemplate {
        name: "manual_testing",
        group: "tool",
        title: "Manual Security Testing",
        content: "Performed manual security testing on [TARGET]. Focus area: [AREA]. \
                  Methodology: [METHODOLOGY]. Findings: [FINDINGS].",
        category: Category::Tool,
        priority: 7,
        confidence: 0.9,
        tags: &["manual-testing", "security-assessment"],
        source: "security-assessment",
    },
];

pub fn find_template(name: &str) -> Option<&'static SecurityTemplate> {
    TEMPLATES.iter().find(|t| t.name == name)
}

/// Substitute `[KEY]` markers. Unmatched markers are left in place.
fn fill(text: &str, replacements: &HashMap<String, String>) -> String {
    replacements.iter().fold(text.to_string(), |acc, (key, value)| {
        acc.replace(&format!("[{}]", key.to_uppercase()), value)
    })
}

/// Store a new entry built from a named template.
pub fn create_entry_from_template(
    conn: &Connection,
    session_id: &str,
    template_name: &str,
    replacements: &HashMap<String, String>,
) -> Result<MemoryEntry> {
    let template =
        find_template(template_name).ok_or_else(|| StoreError::not_found("template", template_name))?;

    let req = CreateEntryRequest {
        session_id: session_id.to_string(),
        title: fill(template.title, replacements),
        content: fill(template.content, replacements),
        content_type: Some(ContentType::Text),
        category: template.category,
        priority: template.priority,
        confidence: template.confidence,
        tags: template.tags.iter().map(|t| t.to_string()).collect(),
        source: template.source.to_string(),
    };
    let entry = create_entry(conn, &req)?;
    tracing::info!(id = %entry.id, template = template_name, "entry created from template");
    Ok(entry)
}
