pub const CHALLENGE: &str = include_str!("../data/prompts/challenge.txt");
pub const EVALUATION: &str = include_str!("../data/prompts/evaluation.txt");
pub const HOST_SYSTEM: &str = include_str!("../data/prompts/host_system.txt");
pub const CONVERSATION: &str = include_str!("../data/prompts/conversation.txt");
pub const CAPTION: &str = include_str!("../data/prompts/caption.txt");
pub const RULES: &str = include_str!("../data/prompts/rules.txt");

/// Fixed texts shown to players.
pub mod messages {
    pub const CHALLENGE_BANNER: &str = "האתגר החדש שלכם הוא:";
    pub const RESULTS_BANNER: &str = "תוצאות ההערכה:";
    pub const NO_ACTIVE_CHALLENGE: &str = "לא נוצר עדיין אתגר. אנא בקשו 'אתגר חדש' תחילה.";
    pub const CHALLENGE_APOLOGY: &str =
        "מצטער, היתה בעיה ביצירת האתגר כרגע. נסה שוב מאוחר יותר.";
    pub const EVALUATION_APOLOGY: &str =
        "מצטער, היתה בעיה בעיבוד ההערכה כרגע. נסה שוב מאוחר יותר.";
    pub const EVALUATION_MISSING_INPUT: &str =
        "שגיאה: יש לספק את נושא האתגר ושני תיאורי תמונות לצורך הערכה.";
    pub const UNSURE_REPLY: &str = "אני לא בטוח איך להגיב על זה. אפשר לנסות משהו אחר?";
    pub const TOPIC_NOT_SET: &str = "לא נקבע עדיין";
    pub const MISSING_IMAGES: &str = "יש להעלות שתי תמונות כדי לבדוק.";
    pub const EMPTY_CAPTION: &str = "תיאור ריק";
    pub const EVALUATE_REQUEST: &str = "הערך בבקשה את ההגשות הללו עבור האתגר הנוכחי.";

    /// Reply used when the captioner fails on one of the submitted images.
    pub fn caption_failure(image_number: usize, reason: &str) -> String {
        format!("שגיאה ביצירת תיאור לתמונה {}: {}", image_number, reason)
    }
}

/// Marker some backends emit instead of a real completion.
pub const PLACEHOLDER_MARKER: &str = "Placeholder response";

/// Blank text or a known placeholder is not a usable completion.
pub fn looks_like_placeholder(text: &str) -> bool {
    text.trim().is_empty() || text.contains(PLACEHOLDER_MARKER)
}

/// Replace `{{key}}` placeholders in a template string.
///
/// Single pass over the template: substituted values are never scanned again,
/// so a value that itself contains `{{key}}` is inserted verbatim. Unknown
/// keys are left in place.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        result.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let substitution = after.find("}}").and_then(|end| {
            let key = &after[..end];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, end))
        });

        match substitution {
            Some((value, end)) => {
                result.push_str(value);
                rest = &after[end + 2..];
            }
            None => {
                result.push_str("{{");
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}
