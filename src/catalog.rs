//! # Category Catalog
//!
//! The closed catalog of the OWASP Top 10 for LLM Applications (2025 edition).
//!
//! The catalog is process-wide immutable data: it lives in a `static` slice, is never
//! created or destroyed at runtime, and every request-facing operation validates its
//! input against it before touching the cache or the generator.

use serde::{Deserialize, Serialize};

/// Static reference data for one catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryInfo {
    /// Category label, e.g. `LLM01:2025 Prompt Injection`
    pub label: &'static str,

    /// One-paragraph description of the risk
    pub description: &'static str,

    /// Official OWASP reference page
    pub url: &'static str,

    /// Typical attack examples
    pub examples: &'static [&'static str],
}

/// Reference metadata attached to a generated playbook
///
/// This is the owned, serializable form of [`CategoryInfo`] that is persisted next to
/// the playbook body and returned to clients as `owasp_context`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwaspContext {
    pub description: String,
    pub url: String,
    pub examples: Vec<String>,
}

impl OwaspContext {
    /// Context used for labels that have no catalog entry
    pub fn fallback() -> Self {
        Self {
            description: "No official description available".to_string(),
            url: "https://genai.owasp.org/llm-top-10/".to_string(),
            examples: Vec::new(),
        }
    }
}

impl From<&CategoryInfo> for OwaspContext {
    fn from(info: &CategoryInfo) -> Self {
        Self {
            description: info.description.to_string(),
            url: info.url.to_string(),
            examples: info.examples.iter().map(|e| e.to_string()).collect(),
        }
    }
}

/// The ten categories, in catalog order
pub static OWASP_TOP_10: &[CategoryInfo] = &[
    CategoryInfo {
        label: "LLM01:2025 Prompt Injection",
        description: "Occurs when an attacker manipulates an LLM through carefully crafted prompts to cause unintended behavior or outputs.",
        url: "https://genai.owasp.org/llmrisk/llm01-prompt-injection/",
        examples: &[
            "Direct prompt injection (e.g., jailbreaking attempts)",
            "Indirect prompt injection via manipulated external data",
            "Multimodal injection with hidden instructions (e.g., in images)",
            "Multilingual/Obfuscated Attack",
        ],
    },
    CategoryInfo {
        label: "LLM02:2025 Sensitive Information Disclosure",
        description: "Occurs when an LLM inadvertently reveals private data, secrets, or sensitive information that should remain confidential.",
        url: "https://genai.owasp.org/llmrisk/llm022025-sensitive-information-disclosure/",
        examples: &[
            "Unintentional Data Exposure",
            "Targeted Prompt Injection",
            "Data Leak via Training Data",
        ],
    },
    CategoryInfo {
        label: "LLM03:2025 Supply Chain",
        description: "Risks introduced through dependencies, pre-trained models, or third-party components used in the LLM application pipeline.",
        url: "https://genai.owasp.org/llmrisk/llm032025-supply-chain/",
        examples: &[
            "Vulnerable Python Library",
            "Direct Tampering",
            "Finetuning Popular Model",
        ],
    },
    CategoryInfo {
        label: "LLM04:2025 Data and Model Poisoning",
        description: "Involves the manipulation of training data or fine-tuning processes to introduce vulnerabilities, biases, or backdoors into the model.",
        url: "https://genai.owasp.org/llmrisk/llm042025-data-and-model-poisoning/",
        examples: &[
            "Injecting malicious data into training sets",
            "Backdoor attacks through manipulated fine-tuning",
            "Bias injection that alters model behavior",
        ],
    },
    CategoryInfo {
        label: "LLM05:2025 Improper Output Handling",
        description: "Occurs when LLM-generated outputs are not properly validated, sanitized, or handled before being passed on to other components.",
        url: "https://genai.owasp.org/llmrisk/llm052025-improper-output-handling/",
        examples: &[
            "XSS via unsanitized outputs",
            "SQL injection through LLM-generated queries",
            "Command injection leading to remote code execution",
        ],
    },
    CategoryInfo {
        label: "LLM06:2025 Excessive Agency",
        description: "When LLMs are granted too much autonomy or authority, enabling them to take actions without proper human oversight or necessary restrictions.",
        url: "https://genai.owasp.org/llmrisk/llm062025-excessive-agency/",
        examples: &[
            "LLM taking unauthorized actions (e.g., sending emails or modifying data)",
            "Bypassing human-in-the-loop approval processes",
            "Automated decisions that lead to harmful outcomes",
        ],
    },
    CategoryInfo {
        label: "LLM07:2025 System Prompt Leakage",
        description: "Occurs when the system prompts or internal instructions that define the LLM's behavior are exposed to unauthorized users.",
        url: "https://genai.owasp.org/llmrisk/llm072025-system-prompt-leakage/",
        examples: &[
            "Leakage of internal system prompts or guardrails",
            "Extraction of confidential business logic from prompt instructions",
            "Unauthorized disclosure of sensitive prompt details",
        ],
    },
    CategoryInfo {
        label: "LLM08:2025 Vector and Embedding Weaknesses",
        description: "Vulnerabilities in the vector storage and retrieval systems that support many LLM applications, which can be exploited to manipulate outputs or access sensitive data.",
        url: "https://genai.owasp.org/llmrisk/llm082025-vector-and-embedding-weaknesses/",
        examples: &[
            "Data Poisoning",
            "Access control & data leakage risk by combining data with different access restrictions",
            "Behavior alteration of the foundation model",
        ],
    },
    CategoryInfo {
        label: "LLM09:2025 Misinformation",
        description: "LLMs generating false, misleading, or harmful information that is presented as factual.",
        url: "https://owasp.org/www-project-top-10-for-large-language-model-applications/descriptions/Misinformation.html",
        examples: &["Hallucinations", "Outdated information", "Fabricated references"],
    },
    CategoryInfo {
        label: "LLM10:2025 Unbounded Consumption",
        description: "Exploitation of LLM resources leading to excessive usage, escalating costs, or denial of service.",
        url: "https://genai.owasp.org/llmrisk/llm102025-unbounded-consumption/",
        examples: &[
            "Denial of Wallet (DoW)",
            "Functional Model Replication",
            "Resource-Intensive Queries",
        ],
    },
];

/// All category labels in catalog order
pub fn labels() -> Vec<&'static str> {
    OWASP_TOP_10.iter().map(|info| info.label).collect()
}

/// Look up a catalog entry by its exact label
pub fn find(label: &str) -> Option<&'static CategoryInfo> {
    OWASP_TOP_10.iter().find(|info| info.label == label)
}

/// Whether `label` names one of the ten catalog entries
pub fn contains(label: &str) -> bool {
    find(label).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_has_ten_unique_labels() {
        let labels = labels();
        assert_eq!(labels.len(), 10);

        let unique: HashSet<_> = labels.iter().collect();
        assert_eq!(unique.len(), 10);
        assert_eq!(labels[0], "LLM01:2025 Prompt Injection");
        assert_eq!(labels[9], "LLM10:2025 Unbounded Consumption");
    }

    #[test]
    fn test_lookup_is_exact() {
        assert!(contains("LLM03:2025 Supply Chain"));
        assert!(!contains("llm03:2025 supply chain"));
        assert!(!contains("LLM03:2025 Supply Chain "));
        assert!(!contains(""));
    }

    #[test]
    fn test_context_conversion() {
        let info = find("LLM09:2025 Misinformation").unwrap();
        let context = OwaspContext::from(info);

        assert_eq!(context.examples.len(), 3);
        assert!(context.url.contains("Misinformation"));
    }

    #[test]
    fn test_fallback_context() {
        let context = OwaspContext::fallback();
        assert!(context.examples.is_empty());
        assert_eq!(context.url, "https://genai.owasp.org/llm-top-10/");
    }
}
