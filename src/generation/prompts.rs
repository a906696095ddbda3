//! Prompt text sent to the generation model.

use crate::catalog::OwaspContext;

/// Index page of the OWASP Top 10 for LLM Applications
pub const OWASP_LLM_TOP_10_URL: &str = "https://genai.owasp.org/llm-top-10/";

pub const SYSTEM_PROMPT: &str = "You are an expert cybersecurity consultant with deep knowledge of OWASP Top 10 for LLM Applications.
Your task is to create accurate, technically detailed, and actionable security playbooks.
Use the web search capability to find the most up-to-date information about the specified vulnerability from official OWASP sources https://genai.owasp.org/llm-top-10/
Avoid generic advice and include specific implementation details, real code examples, and concrete testing methodologies.
Each playbook should be tightly focused on the specific vulnerability and represent current security best practices.";

/// User prompt asking for a playbook on `category`
pub fn user_prompt(category: &str, context: &OwaspContext) -> String {
    let mut prompt = format!(
        "Use web search to find official information about the '{category}' vulnerability from the OWASP Top 10 for LLM Applications {OWASP_LLM_TOP_10_URL}.

Then, generate a comprehensive security playbook for mitigating this vulnerability in LLM applications.

The playbook must include:
1. An in-depth description of the vulnerability and how it works, based on official OWASP documentation
2. Potential impact and risk assessment if exploited
3. 5-7 specific mitigation strategies with detailed technical implementation steps
4. Working code examples using Python, JavaScript, or other relevant languages
5. Testing methodologies to verify protections are working properly
6. Sample policies and guardrails organizations should implement
7. Additional resources and references from authoritative sources

Format the response in a well-structured, markdown format suitable for developers and security professionals."
    );

    if !context.examples.is_empty() {
        prompt.push_str("\n\nOfficial summary: ");
        prompt.push_str(&context.description);
        prompt.push_str("\nReference: ");
        prompt.push_str(&context.url);
        prompt.push_str("\nKnown attack examples:");
        for example in &context.examples {
            prompt.push_str("\n- ");
            prompt.push_str(example);
        }
    }

    prompt
}
