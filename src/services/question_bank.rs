//! Built-in question content: the default bank seeded on first use and the
//! templates offered by the admin generator.

use std::time::SystemTime;

use crate::{dao::models::QuizQuestionEntity, dto::admin::GeneratedQuestion, state::game::Difficulty};

/// Static question used to seed the bank or fill the generator.
#[derive(Debug, Clone, Copy)]
pub struct SeedQuestion {
    pub question: &'static str,
    pub options: [&'static str; 4],
    pub correct: u8,
}

const fn seed(question: &'static str, options: [&'static str; 4], correct: u8) -> SeedQuestion {
    SeedQuestion {
        question,
        options,
        correct,
    }
}

const EASY_DEFAULTS: [SeedQuestion; 8] = [
    seed(
        "What does HTML stand for?",
        [
            "Hyper Text Markup Language",
            "High Tech Modern Language",
            "Home Tool Markup Language",
            "Hyperlink and Text Markup Language",
        ],
        0,
    ),
    seed(
        "Which HTML tag is used for the largest heading?",
        ["<h6>", "<h1>", "<heading>", "<header>"],
        1,
    ),
    seed(
        "What is the correct HTML tag for inserting a line break?",
        ["<break>", "<lb>", "<br>", "<newline>"],
        2,
    ),
    seed(
        "Which attribute specifies the URL of the page the link goes to?",
        ["src", "href", "link", "url"],
        1,
    ),
    seed(
        "What is the correct HTML for creating a hyperlink?",
        [
            "<a url='http://www.example.com'>Example</a>",
            "<a href='http://www.example.com'>Example</a>",
            "<a>http://www.example.com</a>",
            "<link>http://www.example.com</link>",
        ],
        1,
    ),
    seed(
        "Which HTML tag is used to define an internal style sheet?",
        ["<css>", "<script>", "<style>", "<styles>"],
        2,
    ),
    seed(
        "What is the correct HTML for making a text bold?",
        ["<bold>", "<b>", "<strong>", "Both <b> and <strong>"],
        3,
    ),
    seed(
        "Which HTML attribute is used to define inline styles?",
        ["class", "style", "styles", "font"],
        1,
    ),
];

const MEDIUM_DEFAULTS: [SeedQuestion; 8] = [
    seed(
        "Which HTML5 element is used to specify a footer for a document or section?",
        ["<bottom>", "<footer>", "<section>", "<end>"],
        1,
    ),
    seed(
        "What is the correct HTML5 element for playing video files?",
        ["<movie>", "<video>", "<media>", "<film>"],
        1,
    ),
    seed(
        "Which input type is NOT valid in HTML5?",
        ["email", "url", "datetime", "slider"],
        3,
    ),
    seed(
        "What is the purpose of the 'data-*' attributes in HTML5?",
        [
            "To store custom data",
            "To define CSS classes",
            "To create links",
            "To add comments",
        ],
        0,
    ),
    seed(
        "Which HTML5 element is used to draw graphics via scripting?",
        ["<graphics>", "<canvas>", "<draw>", "<svg>"],
        1,
    ),
    seed(
        "What is the correct way to make a number input field?",
        [
            "<input type='num'>",
            "<input type='number'>",
            "<input type='numeric'>",
            "<number>",
        ],
        1,
    ),
    seed(
        "Which attribute makes an input field required?",
        ["required", "mandatory", "needed", "must"],
        0,
    ),
    seed(
        "What is the semantic HTML5 element for navigation links?",
        ["<navigation>", "<nav>", "<menu>", "<links>"],
        1,
    ),
];

const HARD_DEFAULTS: [SeedQuestion; 8] = [
    seed(
        "Which HTML5 API is used for client-side storage that persists even after the browser is closed?",
        ["sessionStorage", "localStorage", "cookies", "indexedDB"],
        1,
    ),
    seed(
        "What is the purpose of the 'srcset' attribute in HTML5?",
        [
            "To set multiple sources",
            "For responsive images",
            "To define fallback sources",
            "All of the above",
        ],
        3,
    ),
    seed(
        "Which HTML5 element is used to represent a scalar measurement within a known range?",
        ["<progress>", "<meter>", "<range>", "<scale>"],
        1,
    ),
    seed(
        "What is the correct way to specify that an input field must be filled out before submitting?",
        [
            "<input required>",
            "<input type='required'>",
            "<input mandatory='true'>",
            "<input validate='true'>",
        ],
        0,
    ),
    seed(
        "Which HTML5 element represents a disclosure widget from which the user can obtain additional information?",
        ["<summary>", "<details>", "<accordion>", "<expand>"],
        1,
    ),
    seed(
        "What is the purpose of the 'contenteditable' attribute?",
        [
            "Makes element draggable",
            "Makes element editable",
            "Makes element clickable",
            "Makes element visible",
        ],
        1,
    ),
    seed(
        "Which HTML5 input type is used for selecting a week and year?",
        ["week", "date-week", "weekly", "week-year"],
        0,
    ),
    seed(
        "What does the 'defer' attribute do in a script tag?",
        [
            "Delays script execution",
            "Executes script after page load",
            "Executes script asynchronously",
            "Prevents script execution",
        ],
        1,
    ),
];

const EASY_TEMPLATES: [SeedQuestion; 5] = [
    seed(
        "What does CSS stand for?",
        [
            "Cascading Style Sheets",
            "Computer Style Sheets",
            "Creative Style Sheets",
            "Colorful Style Sheets",
        ],
        0,
    ),
    seed(
        "Which HTML tag is used to create a paragraph?",
        ["<paragraph>", "<p>", "<para>", "<text>"],
        1,
    ),
    seed(
        "What is the correct way to comment in HTML?",
        ["// comment", "/* comment */", "<!-- comment -->", "# comment"],
        2,
    ),
    seed(
        "Which attribute is used to provide alternative text for an image?",
        ["title", "alt", "src", "text"],
        1,
    ),
    seed(
        "What is the largest heading tag in HTML?",
        ["<h6>", "<h1>", "<head>", "<header>"],
        1,
    ),
];

const MEDIUM_TEMPLATES: [SeedQuestion; 5] = [
    seed(
        "Which CSS property is used to change the text color?",
        ["font-color", "text-color", "color", "foreground-color"],
        2,
    ),
    seed(
        "What is the correct CSS syntax for making all <p> elements bold?",
        [
            "p {text-size: bold;}",
            "p {font-weight: bold;}",
            "p {text-style: bold;}",
            "p {font-style: bold;}",
        ],
        1,
    ),
    seed(
        "Which HTML5 element is used for navigation?",
        ["<navigation>", "<nav>", "<navigate>", "<menu>"],
        1,
    ),
    seed(
        "What does the 'box-sizing' property do in CSS?",
        [
            "Changes box color",
            "Controls how element size is calculated",
            "Sets box position",
            "Creates box shadow",
        ],
        1,
    ),
    seed(
        "Which CSS property is used to create space between elements?",
        ["padding", "margin", "spacing", "gap"],
        1,
    ),
];

const HARD_TEMPLATES: [SeedQuestion; 5] = [
    seed(
        "What is the purpose of the 'viewport' meta tag?",
        [
            "Sets page title",
            "Controls responsive design",
            "Defines character encoding",
            "Links stylesheets",
        ],
        1,
    ),
    seed(
        "Which CSS property creates a flexible layout?",
        ["display: flex", "layout: flex", "flex: true", "flexible: yes"],
        0,
    ),
    seed(
        "What is the difference between 'em' and 'rem' units?",
        [
            "No difference",
            "em is relative to parent, rem to root",
            "rem is relative to parent, em to root",
            "Both are absolute units",
        ],
        1,
    ),
    seed(
        "Which JavaScript method is used to select an element by ID?",
        ["getElementById", "selectById", "findById", "getElementByIdName"],
        0,
    ),
    seed(
        "What is the purpose of CSS Grid?",
        [
            "Create animations",
            "Two-dimensional layout system",
            "Style text",
            "Handle events",
        ],
        1,
    ),
];

/// Default eight questions of a difficulty, in slot order.
pub fn defaults(difficulty: Difficulty) -> &'static [SeedQuestion] {
    match difficulty {
        Difficulty::Easy => &EASY_DEFAULTS,
        Difficulty::Medium => &MEDIUM_DEFAULTS,
        Difficulty::Hard => &HARD_DEFAULTS,
    }
}

/// Generator templates of a difficulty.
pub fn templates(difficulty: Difficulty) -> &'static [SeedQuestion] {
    match difficulty {
        Difficulty::Easy => &EASY_TEMPLATES,
        Difficulty::Medium => &MEDIUM_TEMPLATES,
        Difficulty::Hard => &HARD_TEMPLATES,
    }
}

/// Entities for the default bank of a difficulty, slots numbered from 1.
pub fn default_entities(difficulty: Difficulty, now: SystemTime) -> Vec<QuizQuestionEntity> {
    numbered(defaults(difficulty))
        .map(|(slot, seed)| {
            QuizQuestionEntity::new(
                difficulty,
                slot,
                seed.question.to_owned(),
                seed.options.iter().map(|option| (*option).to_owned()).collect(),
                seed.correct,
                now,
            )
        })
        .collect()
}

/// Proposals returned by the admin generator.
pub fn generated(difficulty: Difficulty) -> Vec<GeneratedQuestion> {
    numbered(templates(difficulty))
        .map(|(slot, seed)| GeneratedQuestion {
            question_id: slot,
            difficulty,
            question: seed.question.to_owned(),
            options: seed.options.iter().map(|option| (*option).to_owned()).collect(),
            correct_answer: seed.correct,
        })
        .collect()
}

fn numbered(seeds: &'static [SeedQuestion]) -> impl Iterator<Item = (u8, &'static SeedQuestion)> {
    (1u8..).zip(seeds.iter())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::rules::QUIZ_LENGTH;

    #[test]
    fn every_difficulty_has_a_full_default_round() {
        for difficulty in Difficulty::ALL {
            let entities = default_entities(difficulty, SystemTime::now());
            assert_eq!(entities.len(), usize::from(QUIZ_LENGTH));
            let slots: Vec<u8> = entities.iter().map(|q| q.question_id).collect();
            assert_eq!(slots, (1..=QUIZ_LENGTH).collect::<Vec<_>>());
            assert!(entities.iter().all(|q| q.difficulty == difficulty));
        }
    }

    #[test]
    fn answers_point_at_existing_options() {
        for difficulty in Difficulty::ALL {
            for seed in defaults(difficulty).iter().chain(templates(difficulty)) {
                assert!(seed.correct < 4, "{}", seed.question);
            }
        }
    }

    #[test]
    fn generator_offers_five_templates() {
        let generated = generated(Difficulty::Hard);
        assert_eq!(generated.len(), 5);
        assert_eq!(generated[1].options[0], "display: flex");
        assert_eq!(generated[1].correct_answer, 0);
    }
}
