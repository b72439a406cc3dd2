//! Prompt templates and the JSON contract each one documents.

pub const VIDEO_REQUIRED_KEYS: &[&str] = &["summary", "key_concepts"];
pub const PROBLEM_REQUIRED_KEYS: &[&str] = &["problem_type", "solution_steps"];
pub const DOCUMENT_REQUIRED_KEYS: &[&str] = &["summary", "main_topics"];
pub const CREATIVE_REQUIRED_KEYS: &[&str] = &["analysis", "improvements"];
pub const RECOMMENDATION_REQUIRED_KEYS: &[&str] = &["recommended_level"];

const JSON_ONLY: &str =
    "Respond with a single JSON object and nothing else: no markdown, no prose around it.";

pub fn video_analysis(context: &str) -> String {
    format!(
        r#"Analyze this educational video in depth. {context}

{JSON_ONLY}
Fields:
1. "summary": a complete summary of the content
2. "key_concepts": list of the main concepts covered
3. "difficulty_level": one of beginner/intermediate/advanced
4. "timestamps": key moments, each {{"time": "MM:SS", "description": "..."}}
5. "interactive_questions": 5-7 questions to ask while watching,
   each {{"timestamp": "MM:SS", "question": "...", "hint": "...", "answer": "..."}}
6. "prerequisites": recommended prior knowledge"#
    )
}

pub fn image_problem(subject_hint: &str) -> String {
    format!(
        r#"You are an expert tutor using the Socratic method.
Analyze this {subject_hint} problem.

{JSON_ONLY}
Fields:
1. "problem_type": the kind of problem identified
2. "difficulty": difficulty from 1 to 10
3. "concepts_needed": list of required concepts
4. "solution_steps": ordered steps that do not reveal the full solution,
   each {{"step": 1, "hint": "...", "question": "...", "concepts": [...]}}
5. "final_answer": the complete solution (kept hidden from the student at first)
6. "similar_problems": 3 similar problems for practice

Guide the student; never hand over the answer directly."#
    )
}

pub fn document_analysis(focus_areas: &str) -> String {
    let focus = if focus_areas.trim().is_empty() {
        String::new()
    } else {
        format!("Focus on: {}", focus_areas.trim())
    };
    format!(
        r#"Analyze this academic or technical document in depth.
{focus}

{JSON_ONLY}
Fields:
1. "summary": executive summary of the document
2. "main_topics": list of the main topics
3. "concept_map":
   - "nodes": [{{"id": "unique_id", "label": "Concept", "level": 1, "description": "..."}}] with level 1-3
   - "edges": [{{"from": "id1", "to": "id2", "relationship": "..."}}]
4. "key_definitions": object mapping important terms to definitions
5. "quiz_questions": 10 questions of mixed levels,
   each {{"level": "easy|medium|hard", "question": "...", "options": [...], "correct": 0, "explanation": "..."}}
6. "analogies": analogies that simplify the complex concepts
7. "further_reading": suggestions for further reading"#
    )
}

pub fn creative_workshop(creative_goal: &str) -> String {
    format!(
        r#"You are a creative mentor with expertise in design, architecture and visual arts.
Analyze this work or sketch. {creative_goal}

{JSON_ONLY}
Fields:
1. "analysis": detailed analysis of what is presented
2. "strengths": 3-5 strengths of the design
3. "improvements": 5-7 suggestions,
   each {{"aspect": "...", "suggestion": "...", "why": "...", "priority": "high|medium|low"}}
4. "design_principles": applicable design principles
5. "variations": 3 variations or alternatives to explore
6. "technique_tips": specific technical advice
7. "inspiration": similar references or artists
8. "next_steps": action plan to develop the project"#
    )
}

pub fn tutor_system_instruction(context: &str, user_level: &str) -> String {
    format!(
        r#"You are NeuralSync AI, an expert adaptive tutor.

Session context: {context}
Learner level: {user_level}

Principles:
1. Use the Socratic method: guide with questions.
2. Adapt your language to the learner's level.
3. Give concrete examples and analogies.
4. Encourage and celebrate progress.
5. Detect gaps in understanding and adjust.
6. Never reveal final answers directly.

Answer concisely with a clear structure."#
    )
}

pub fn answer_evaluation(
    question: &str,
    user_answer: &str,
    correct_answer: &str,
    context: &str,
) -> String {
    format!(
        r#"Evaluate this student answer with kindness and pedagogy.
{context}

Question: {question}
Student answer: {user_answer}
Expected answer: {correct_answer}

{JSON_ONLY}
Fields:
1. "is_correct": true or false
2. "correctness_percentage": 0-100 (partial credit allowed)
3. "feedback": constructive and encouraging feedback
4. "what_was_good": what was good in the answer
5. "what_to_improve": specific points to improve
6. "hint_for_next_time": advice for similar questions
7. "encouragement": personal motivating message"#
    )
}

pub fn practice_problems(topic: &str, difficulty: &str, count: u32) -> String {
    format!(
        r#"Generate {count} practice problems about: {topic}
Difficulty: {difficulty}

{JSON_ONLY}
Shape:
{{"problems": [
  {{
    "id": 1,
    "problem": "problem statement",
    "type": "multiple_choice|open_ended|true_false",
    "options": ["..."],
    "solution": "detailed solution",
    "hints": ["hint1", "hint2"],
    "learning_objective": "what this problem teaches"
  }}
]}}
Use an empty "options" list when the type has none."#
    )
}

pub fn difficulty_recommendation(stats_json: &str) -> String {
    format!(
        r#"Analyze these learning statistics and recommend the optimal level:

{stats_json}

{JSON_ONLY}
Fields:
1. "recommended_level": recommended level (easy|medium|hard)
2. "reasoning": why this level
3. "strengths": identified strong areas
4. "areas_to_focus": areas to work on
5. "learning_pace": slow|medium|fast
6. "motivation_message": personal motivating message"#
    )
}

pub fn hint_request(problem: &str, current_progress: &str) -> String {
    format!(
        r#"The student is working on this problem: {problem}
Current progress: {current_progress}

Give ONE subtle hint that guides without revealing the solution.
The hint must be encouraging and pedagogical.
Reply only with JSON: {{"hint": "...", "encouragement": "..."}}"#
    )
}

pub fn first_question(mode_label: &str) -> String {
    format!(
        "You have just analyzed the learner's content in the \"{mode_label}\" workflow. \
         Open the conversation with one short Socratic question that checks what the learner \
         already understands. Reply with the question only."
    )
}
