//! Built-in example programs for beginners.

use super::types::{CodeExample, Difficulty};

const EXAMPLES: &[(&str, &str, &str, Difficulty)] = &[
    (
        "Hello World",
        "Your first Python program",
        r#"print("Hello, World!")"#,
        Difficulty::Beginner,
    ),
    (
        "Variables and Math",
        "Working with variables and basic math",
        r#"name = "Python"
age = 30
print(f"My name is {name} and I'm {age} years old")
print(f"Next year I'll be {age + 1}")"#,
        Difficulty::Beginner,
    ),
    (
        "Lists and Loops",
        "Working with lists and for loops",
        r#"fruits = ["apple", "banana", "orange"]
for fruit in fruits:
    print(f"I like {fruit}")

print(f"Total fruits: {len(fruits)}")"#,
        Difficulty::Beginner,
    ),
    (
        "Functions",
        "Creating and using functions",
        r#"def greet(name):
    return f"Hello, {name}!"

def add_numbers(a, b):
    return a + b

print(greet("World"))
print(f"2 + 3 = {add_numbers(2, 3)}")"#,
        Difficulty::Intermediate,
    ),
    (
        "Conditionals",
        "Using if/else statements",
        r#"age = 18

if age >= 18:
    print("You are an adult")
elif age >= 13:
    print("You are a teenager")
else:
    print("You are a child")"#,
        Difficulty::Beginner,
    ),
];

/// The built-in examples, in teaching order
pub fn code_examples() -> Vec<CodeExample> {
    EXAMPLES
        .iter()
        .map(|(title, description, code, difficulty)| CodeExample {
            title: title.to_string(),
            description: description.to_string(),
            code: code.to_string(),
            difficulty: *difficulty,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::StaticAnalyzer;
    use crate::config::ExecutionConfig;

    #[test]
    fn test_examples_pass_default_analysis() {
        let analyzer = StaticAnalyzer::new(&ExecutionConfig::default()).unwrap();
        for example in code_examples() {
            let verdict = analyzer.check(&example.code);
            assert!(verdict.safe, "{} rejected: {:?}", example.title, verdict.violation);
        }
    }

    #[test]
    fn test_examples_listed() {
        let examples = code_examples();
        assert_eq!(examples.len(), 5);
        assert_eq!(examples[0].title, "Hello World");
    }
}
