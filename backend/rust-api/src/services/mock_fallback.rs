//! Canned stand-ins for model output, served while the provider is
//! rate-limited or overloaded.

use serde_json::{json, Value};

use crate::models::SessionMode;

const DEMO_TOKENS: &[&str] = &["demo", "code", "math", "pdf", "rapport", "test"];

pub const DEMO_NOTICE: &str =
    "(Demo mode: the AI service is temporarily unavailable, this is a sample reply.)";

/// Whether `filename` is on the demo allowlist.
pub fn is_demo_file(filename: &str) -> bool {
    let lowered = filename.to_lowercase();
    DEMO_TOKENS.iter().any(|token| lowered.contains(token))
}

/// Analysis with the same field names a real reply for `mode` has.
pub fn mock_analysis(filename: &str, mode: SessionMode) -> Value {
    match mode {
        SessionMode::Video => json!({
            "summary": format!("Sample overview of the video \"{}\".", filename),
            "key_concepts": ["Core idea", "Worked example", "Common pitfalls"],
            "difficulty_level": "intermediate",
            "timestamps": [
                {"time": "00:00", "description": "Introduction"},
                {"time": "02:30", "description": "Main demonstration"},
                {"time": "05:00", "description": "Recap"}
            ],
            "interactive_questions": [
                {
                    "timestamp": "02:30",
                    "question": "What would change if the first step were skipped?",
                    "hint": "Look at what the first step sets up.",
                    "answer": "The later steps would lack their starting point."
                }
            ],
            "prerequisites": ["Basic vocabulary of the subject"]
        }),
        SessionMode::Problem => json!({
            "problem_type": "Multi-step reasoning problem",
            "difficulty": 5,
            "concepts_needed": ["Reading the statement carefully", "Breaking a problem into steps"],
            "solution_steps": [
                {
                    "step": 1,
                    "hint": "Write down what is given and what is asked.",
                    "question": "Which quantities do you already know?",
                    "concepts": ["Problem decomposition"]
                },
                {
                    "step": 2,
                    "hint": "Find a relation linking the known and the unknown.",
                    "question": "Which rule connects them?",
                    "concepts": ["Relations"]
                }
            ],
            "final_answer": "Available once the live analysis is back.",
            "similar_problems": [
                "The same problem with different values",
                "The reverse problem",
                "A two-step variant"
            ]
        }),
        SessionMode::Document => json!({
            "summary": format!("Sample summary of the document \"{}\".", filename),
            "main_topics": ["Introduction", "Key arguments", "Conclusion"],
            "concept_map": {
                "nodes": [
                    {"id": "main", "label": "Main topic", "level": 1, "description": "What the document is about"},
                    {"id": "arg", "label": "Key argument", "level": 2, "description": "The central claim"},
                    {"id": "ex", "label": "Example", "level": 3, "description": "Supporting evidence"}
                ],
                "edges": [
                    {"from": "main", "to": "arg", "relationship": "develops"},
                    {"from": "arg", "to": "ex", "relationship": "is supported by"}
                ]
            },
            "key_definitions": {"Main topic": "The subject the document is organised around"},
            "quiz_questions": [
                {
                    "level": "easy",
                    "question": "What is the main topic of the document?",
                    "options": ["The introduction", "The main topic", "The references"],
                    "correct": 1,
                    "explanation": "Every section relates back to it."
                }
            ],
            "analogies": ["A document is like a building: the topic is the foundation."],
            "further_reading": ["An introductory text on the same subject"]
        }),
        SessionMode::Creative => json!({
            "analysis": format!("Sample critique of \"{}\".", filename),
            "strengths": ["Clear intent", "Good use of contrast", "Balanced layout"],
            "improvements": [
                {
                    "aspect": "Composition",
                    "suggestion": "Strengthen the focal point.",
                    "why": "The eye needs a place to land.",
                    "priority": "high"
                },
                {
                    "aspect": "Color",
                    "suggestion": "Limit the palette to three main hues.",
                    "why": "Fewer colors read as more intentional.",
                    "priority": "medium"
                }
            ],
            "design_principles": ["Hierarchy", "Contrast", "Alignment"],
            "variations": ["A minimal version", "A high-contrast version", "A monochrome study"],
            "technique_tips": ["Sketch thumbnails before committing to a layout"],
            "inspiration": ["Bauhaus posters"],
            "next_steps": ["Pick one variation and develop it fully"]
        }),
    }
}

const CHAT_TEMPLATES: &[&str] = &[
    "Good question! Before I answer, think about {concept}. How would you explain it in your own words?",
    "Let's reason it out together. The material says: {summary} Which part of that connects to your question?",
    "Try approaching it through {concept}. What do you already know about it, and what feels unclear?",
    "Interesting! If you had to teach {concept} to a friend, where would you start?",
];

/// Socratic reply built from stored key concepts and summary.
pub fn mock_chat_reply(key_concepts: &[Value], summary: &str) -> String {
    let concept = key_concepts
        .iter()
        .find_map(|concept| match concept {
            Value::String(text) => Some(text.clone()),
            Value::Object(map) => map
                .get("label")
                .or_else(|| map.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .unwrap_or_else(|| "the main idea".to_string());

    let summary = if summary.trim().is_empty() {
        "the key ideas of this session."
    } else {
        summary.trim()
    };

    let template = CHAT_TEMPLATES[rand::random_range(0..CHAT_TEMPLATES.len())];
    let reply = template
        .replace("{concept}", &concept)
        .replace("{summary}", summary);
    format!("{}\n\n{}", reply, DEMO_NOTICE)
}
