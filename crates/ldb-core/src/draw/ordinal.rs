const WORDS: [&str; 10] = [
    "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth",
];

/// `1` -> "first" ... `10` -> "tenth", then numeric ordinals ("11th", "21st", ...).
pub fn ordinal_label(position: usize) -> String {
    if (1..=WORDS.len()).contains(&position) {
        return WORDS[position - 1].to_string();
    }

    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_ten_places_are_words() {
        let labels: Vec<String> = (1..=10).map(ordinal_label).collect();
        assert_eq!(
            labels,
            vec![
                "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth",
                "ninth", "tenth"
            ]
        );
    }

    #[test]
    fn later_places_are_numeric() {
        assert_eq!(ordinal_label(11), "11th");
        assert_eq!(ordinal_label(12), "12th");
        assert_eq!(ordinal_label(13), "13th");
        assert_eq!(ordinal_label(21), "21st");
        assert_eq!(ordinal_label(22), "22nd");
        assert_eq!(ordinal_label(103), "103rd");
        assert_eq!(ordinal_label(111), "111th");
    }
}
