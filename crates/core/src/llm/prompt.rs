use crate::llm::ChatPrompt;
use crate::time::forecast::ForecastWindow;
use chrono::NaiveDate;

fn system_prompt() -> String {
    [
        "You are a professional financial fortune analyst, versed in traditional numerology",
        "and modern personal wealth management.",
        "Return ONLY valid JSON. Do not wrap it in markdown and do not add prose.",
    ]
    .join(" ")
}

fn user_prompt(name: &str, birthdate: NaiveDate, seed: u8, window: &ForecastWindow) -> String {
    let dates = window
        .dates()
        .iter()
        .map(|d| d.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Analyse the financial fortune of \"{name}\", born {birthdate}, for the next 7 days ({dates}).\n\n\
Their numerology lucky number is {seed}; take it into account.\n\n\
For each day provide:\n\
1. a fortune score (integer 1-10)\n\
2. a description of the day's financial luck (about 100 words)\n\
3. advice (about 50 words)\n\
4. the day's lucky number (integer 1-9, derived from the base lucky number but varying per day)\n\
5. suitable financial activities (e.g. investing, saving, hedging)\n\n\
Respond with a strict JSON array of exactly 7 objects, one per date above and in that order.\n\
Each object must have exactly these fields: date, score, description, advice, luckyNumber, activities.\n\
date must be YYYY-MM-DD."
    )
}

pub fn build(name: &str, birthdate: NaiveDate, seed: u8, window: &ForecastWindow) -> ChatPrompt {
    ChatPrompt {
        system: system_prompt(),
        user: user_prompt(name, birthdate, seed, window),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_embeds_request_and_every_date() {
        let window = ForecastWindow::starting(NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        let birthdate = NaiveDate::from_ymd_opt(1990, 5, 15).unwrap();
        let prompt = build("Alice", birthdate, 3, &window);

        assert!(prompt.system.contains("financial fortune analyst"));
        assert!(prompt.user.contains("\"Alice\""));
        assert!(prompt.user.contains("1990-05-15"));
        assert!(prompt.user.contains("lucky number is 3"));
        for d in window.dates() {
            assert!(prompt.user.contains(&d.to_string()), "missing {d}");
        }
        for field in ["date", "score", "description", "advice", "luckyNumber", "activities"] {
            assert!(prompt.user.contains(field), "missing field {field}");
        }
    }
}
