//! Exam-preparation knowledge base and wellness-chat prompt assembly.

/// Strategy sheet for one competitive exam.
pub struct ExamStrategy {
    pub name: &'static str,
    pub subjects: &'static [&'static str],
    pub tips: &'static [&'static str],
    pub resources: &'static str,
}

/// Exam-specific preparation strategies, keyed by exam name in the message.
pub static EXAM_STRATEGIES: &[ExamStrategy] = &[
    ExamStrategy {
        name: "JEE",
        subjects: &["Physics", "Chemistry", "Mathematics"],
        tips: &[
            "Master NCERT thoroughly before moving to advanced books",
            "Practice 3+ years of previous papers",
            "Focus on conceptual clarity over memorization",
            "Daily problem-solving: 2-3 hours minimum",
            "Weak topics first, then strengthen strong areas",
        ],
        resources: "NCERT, HC Verma (Physics), OP Tandon (Chemistry), RD Sharma (Math)",
    },
    ExamStrategy {
        name: "NEET",
        subjects: &["Physics", "Chemistry", "Biology"],
        tips: &[
            "Biology = NCERT line-by-line (most important)",
            "Physics: 300+ numerical practice mandatory",
            "Chemistry: Daily organic reactions revision",
            "Weekly mock tests are non-negotiable",
            "Error log book for every wrong answer",
        ],
        resources: "NCERT (Biology), DC Pandey (Physics), MS Chauhan (Chemistry)",
    },
    ExamStrategy {
        name: "CUET",
        subjects: &["Domain subjects", "General Test", "Language"],
        tips: &[
            "Domain subjects = NCERT deep-dive",
            "General test = 1 year current affairs coverage",
            "Language section: 30 min daily reading practice",
            "University-specific syllabus check mandatory",
            "Time management: 60 min per section practice",
        ],
        resources: "NCERT, Current Affairs compilations, Previous year papers",
    },
    ExamStrategy {
        name: "GATE",
        subjects: &["Engineering Core", "Aptitude", "Mathematics"],
        tips: &[
            "Standard textbooks > coaching notes",
            "Previous 15 years papers analysis essential",
            "Virtual calculator practice (2 weeks before exam)",
            "Revision: 3 cycles minimum",
            "Weak subjects: 60% time allocation",
        ],
        resources: "Standard textbooks, GATE previous papers, NPTEL lectures",
    },
];

/// Proven study techniques the prompt always offers.
pub static STUDY_TECHNIQUES: &[(&str, &str)] = &[
    (
        "time_management",
        "Use Pomodoro: 25 min focused study + 5 min break. Track daily hours.",
    ),
    (
        "active_recall",
        "Close book, write what you remember. Test yourself before reviewing.",
    ),
    (
        "spaced_repetition",
        "Review after 1 day, 3 days, 7 days, 14 days for long-term retention.",
    ),
    (
        "feynman",
        "Explain concepts in simple terms as if teaching a 12-year-old.",
    ),
    (
        "practice_testing",
        "70% practice problems, 30% reading. Testing > passive reading.",
    ),
    (
        "interleaving",
        "Mix different subjects/topics in one session for better retention.",
    ),
    (
        "mind_mapping",
        "Create visual connections between topics for better recall.",
    ),
];

/// Find the exam a message is about, if any.
pub fn detect_exam(message: &str) -> Option<&'static ExamStrategy> {
    let lower = message.to_lowercase();
    EXAM_STRATEGIES
        .iter()
        .find(|s| lower.contains(&s.name.to_lowercase()))
}

/// Assemble the study-buddy system prompt for a message.
pub fn system_prompt(message: &str, context: Option<&str>) -> String {
    let techniques = STUDY_TECHNIQUES
        .iter()
        .map(|(name, desc)| format!("- {name}: {desc}"))
        .collect::<Vec<_>>()
        .join("\n");

    let exam_context = match detect_exam(message) {
        Some(exam) => format!(
            "\n\nExam: {}\nKey subjects: {}\nTop strategies: {}\nRecommended resources: {}",
            exam.name,
            exam.subjects.join(", "),
            exam.tips[..3].join("; "),
            exam.resources,
        ),
        None => String::new(),
    };

    format!(
        "You are an expert Study Buddy AI specializing in exam preparation and academic success.\n\n\
         Your role:\n\
         - Provide specific, actionable study advice\n\
         - Be encouraging but realistic\n\
         - Focus on proven study techniques\n\
         - Give concrete examples and strategies\n\
         - Keep responses concise (3-4 sentences max)\n\n\
         Study Techniques Available:\n{techniques}{exam_context}\n\n\
         Guidelines:\n\
         1. If student asks about a specific exam, use the exam-specific strategies\n\
         2. If asking about study methods, recommend proven techniques\n\
         3. If asking about time management, give specific schedules\n\
         4. If asking about stress, acknowledge it and provide coping strategies\n\
         5. Always end with ONE actionable next step\n\n\
         Context: {}\n\n\
         Keep responses under 100 words. Be specific, not generic.",
        context.unwrap_or("General study guidance"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_exam_case_insensitively() {
        assert_eq!(detect_exam("how do I prepare for neet?").unwrap().name, "NEET");
        assert_eq!(detect_exam("JEE physics is hard").unwrap().name, "JEE");
        assert!(detect_exam("I feel stressed").is_none());
    }

    #[test]
    fn prompt_includes_exam_context_when_detected() {
        let prompt = system_prompt("help me with GATE prep", None);
        assert!(prompt.contains("Exam: GATE"));
        assert!(prompt.contains("NPTEL lectures"));
    }

    #[test]
    fn prompt_always_lists_study_techniques() {
        let prompt = system_prompt("I can't focus", None);
        assert!(prompt.contains("active_recall"));
        assert!(!prompt.contains("Exam:"));
        assert!(prompt.contains("General study guidance"));
    }
}
