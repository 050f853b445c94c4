use anyhow::{anyhow, Result};
use colored::*;
use lifecycle::Settings;

/// List the effective settings, secrets masked
pub fn list(settings: &Settings, format: String) -> Result<()> {
    let redacted = settings.redacted();

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&redacted)?);
        }
        "yaml" => {
            println!("{}", serde_yaml::to_string(&redacted)?);
        }
        _ => {
            print_settings_text(&serde_yaml::to_value(&redacted)?);
        }
    }

    Ok(())
}

/// Read a single settings value by dotted path
pub fn get(settings: &Settings, section: String, format: String) -> Result<()> {
    let root = serde_yaml::to_value(settings.redacted())?;
    let parts: Vec<&str> = section.split('.').filter(|p| !p.is_empty()).collect();
    let value = navigate_settings_path(&root, &parts)?;

    match format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        "yaml" => {
            println!("{}", serde_yaml::to_string(&value)?);
        }
        _ => {
            print_settings_value(&section, &value);
        }
    }

    Ok(())
}

/// Walk `path` through nested mappings; sequences are indexed by position
fn navigate_settings_path(root: &serde_yaml::Value, path: &[&str]) -> Result<serde_yaml::Value> {
    if path.is_empty() {
        return Err(anyhow!("Empty settings path"));
    }

    let mut current = root;
    for (i, &key) in path.iter().enumerate() {
        let next = match current {
            serde_yaml::Value::Mapping(map) => map.get(key),
            serde_yaml::Value::Sequence(seq) => key.parse::<usize>().ok().and_then(|n| seq.get(n)),
            _ => {
                return Err(anyhow!(
                    "Cannot navigate further from '{}': not a mapping",
                    path[..i].join(".")
                ));
            }
        };
        current = next.ok_or_else(|| anyhow!("Settings key '{}' not found", path[..=i].join(".")))?;
    }

    Ok(current.clone())
}

fn print_settings_text(settings: &serde_yaml::Value) {
    println!("{}", "=== NGSI Asset Settings ===".bold());
    println!();

    let serde_yaml::Value::Mapping(sections) = settings else {
        print_yaml_value(settings, 0);
        return;
    };

    for (name, value) in sections {
        let name = name.as_str().unwrap_or("?");
        match value {
            serde_yaml::Value::Mapping(_) | serde_yaml::Value::Sequence(_) => {
                println!("{}", format!("[{}]", name).cyan().bold());
                print_yaml_value(value, 1);
            }
            _ => {
                print!("{}: ", name.cyan().bold());
                print_yaml_value(value, 0);
            }
        }
    }

    println!();
    println!("{}", format!("Total entries: {}", sections.len()).green());
}

fn print_settings_value(path: &str, value: &serde_yaml::Value) {
    println!("{}: {}", "Path".bold(), path.cyan());
    println!("{}: {}", "Type".bold(), value_type_name(value).yellow());
    println!("{}:", "Value".bold());
    print_yaml_value(value, 1);
}

fn value_type_name(value: &serde_yaml::Value) -> &str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "boolean",
        serde_yaml::Value::Number(_) => "number",
        serde_yaml::Value::String(_) => "string",
        serde_yaml::Value::Sequence(_) => "array",
        serde_yaml::Value::Mapping(_) => "object",
        serde_yaml::Value::Tagged(_) => "tagged",
    }
}

/// Recursively print a YAML value with indentation
fn print_yaml_value(value: &serde_yaml::Value, indent_level: usize) {
    let indent = "  ".repeat(indent_level);

    match value {
        serde_yaml::Value::Null => println!("{}{}", indent, "unset".dimmed()),
        serde_yaml::Value::Bool(b) => println!("{}{}", indent, b.to_string().blue()),
        serde_yaml::Value::Number(n) => println!("{}{}", indent, n.to_string().magenta()),
        serde_yaml::Value::String(s) if s.contains("://") => println!("{}{}", indent, s.green()),
        serde_yaml::Value::String(s) => println!("{}{}", indent, s.yellow()),
        serde_yaml::Value::Sequence(seq) => {
            for item in seq {
                println!("{}-", indent);
                print_yaml_value(item, indent_level + 1);
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (key, val) in map {
                let key = key.as_str().unwrap_or("?");
                match val {
                    serde_yaml::Value::Mapping(_) | serde_yaml::Value::Sequence(_) => {
                        println!("{}{}:", indent, key.cyan());
                        print_yaml_value(val, indent_level + 1);
                    }
                    _ => {
                        print!("{}{}: ", indent, key.cyan());
                        print_yaml_value(val, 0);
                    }
                }
            }
        }
        serde_yaml::Value::Tagged(tagged) => {
            println!("{}!{}", indent, tagged.tag);
            print_yaml_value(&tagged.value, indent_level + 1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_value() -> serde_yaml::Value {
        let mut settings = Settings::default();
        settings.identity.password = "s3cret".to_string();
        serde_yaml::to_value(settings.redacted()).unwrap()
    }

    #[test]
    fn test_navigate_settings_path() {
        let root = settings_value();

        let result = navigate_settings_path(&root, &["identity", "url"]).unwrap();
        assert_eq!(
            result,
            serde_yaml::Value::String("http://idm.docker:5000".to_string())
        );

        let result = navigate_settings_path(&root, &["units", "0", "name"]).unwrap();
        assert_eq!(result, serde_yaml::Value::String("Api call".to_string()));

        assert!(navigate_settings_path(&root, &["invalid"]).is_err());
        assert!(navigate_settings_path(&root, &["identity", "url", "deeper"]).is_err());
        assert!(navigate_settings_path(&root, &[]).is_err());
    }

    #[test]
    fn test_secrets_are_masked() {
        let root = settings_value();
        let password = navigate_settings_path(&root, &["identity", "password"]).unwrap();
        assert_eq!(password, serde_yaml::Value::String("********".to_string()));
    }

    #[test]
    fn test_value_type_name() {
        assert_eq!(value_type_name(&serde_yaml::Value::Null), "null");
        assert_eq!(value_type_name(&serde_yaml::Value::Bool(true)), "boolean");
        assert_eq!(
            value_type_name(&serde_yaml::Value::Sequence(vec![])),
            "array"
        );
    }
}
