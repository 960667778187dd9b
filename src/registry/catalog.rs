// file: src/registry/catalog.rs
// version: 1.0.0
// guid: 1d6f3b92-7e58-4a04-bc31-95d2e80f7a16

//! Builtin tool catalogue
//!
//! The static table of external security tools the agent knows how to drive.
//! A YAML catalogue file can overlay or extend these entries at startup.

use super::{DangerLevel, ToolCategory, ToolDescriptor};

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// The builtin tool table
pub fn builtin_descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "nmap".into(),
            path: "nmap".into(),
            category: ToolCategory::NetworkScanning,
            description: "Network exploration and security auditing".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["-sS", "-sV", "-sC", "-O", "-A"]),
            output_format_flags: strings(&["-oN", "-oX", "-oG"]),
        },
        ToolDescriptor {
            name: "masscan".into(),
            path: "masscan".into(),
            category: ToolCategory::NetworkScanning,
            description: "High-speed port scanner".into(),
            danger_level: DangerLevel::Medium,
            requires_confirmation: false,
            requires_root: true,
            common_args: strings(&["-p1-65535", "--rate=1000"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "nikto".into(),
            path: "nikto".into(),
            category: ToolCategory::WebScanning,
            description: "Web server scanner".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["-h", "-C", "all", "-Format", "htm"]),
            output_format_flags: strings(&["-output"]),
        },
        ToolDescriptor {
            name: "dirb".into(),
            path: "dirb".into(),
            category: ToolCategory::WebScanning,
            description: "Web content scanner".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["-r", "-S", "-w"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "gobuster".into(),
            path: "gobuster".into(),
            category: ToolCategory::WebScanning,
            description: "Directory/file and DNS busting tool".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["dir", "-u", "-w", "-t", "50"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "sqlmap".into(),
            path: "sqlmap".into(),
            category: ToolCategory::WebExploitation,
            description: "SQL injection testing tool".into(),
            danger_level: DangerLevel::Medium,
            requires_confirmation: true,
            requires_root: false,
            common_args: strings(&["-u", "--batch", "--random-agent"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "subfinder".into(),
            path: "subfinder".into(),
            category: ToolCategory::InformationGathering,
            description: "Subdomain discovery tool".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["-d", "-o", "-silent"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "theharvester".into(),
            path: "theharvester".into(),
            category: ToolCategory::InformationGathering,
            description: "Email and host harvesting tool".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["-d", "-b", "-l", "500"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "whois".into(),
            path: "whois".into(),
            category: ToolCategory::InformationGathering,
            description: "Domain registration lookup".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: Vec::new(),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "dig".into(),
            path: "dig".into(),
            category: ToolCategory::InformationGathering,
            description: "DNS lookup utility".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: strings(&["ANY", "+short", "+trace"]),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "nslookup".into(),
            path: "nslookup".into(),
            category: ToolCategory::InformationGathering,
            description: "DNS lookup utility".into(),
            danger_level: DangerLevel::Low,
            requires_confirmation: false,
            requires_root: false,
            common_args: Vec::new(),
            output_format_flags: Vec::new(),
        },
        ToolDescriptor {
            name: "metasploit".into(),
            path: "msfconsole".into(),
            category: ToolCategory::Exploitation,
            description: "Penetration testing framework".into(),
            danger_level: DangerLevel::High,
            requires_confirmation: true,
            requires_root: false,
            common_args: Vec::new(),
            output_format_flags: Vec::new(),
        },
    ]
}

/// Tools considered relevant for each executable intent, in preference order
pub fn tools_for_intent(intent: &str) -> &'static [&'static str] {
    match intent {
        "network_scanning" => &["nmap", "masscan"],
        "web_scanning" => &["nikto", "dirb", "gobuster"],
        "web_exploitation" => &["sqlmap"],
        "information_gathering" => &["subfinder", "theharvester", "whois", "dig", "nslookup"],
        "exploitation" => &["metasploit"],
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table_has_core_tools() {
        let names: Vec<String> = builtin_descriptors().into_iter().map(|d| d.name).collect();
        for expected in ["nmap", "nikto", "gobuster", "whois", "subfinder", "dig"] {
            assert!(names.contains(&expected.to_string()), "missing {}", expected);
        }
    }

    #[test]
    fn test_high_danger_entries_require_confirmation() {
        for desc in builtin_descriptors() {
            if desc.danger_level == DangerLevel::High {
                assert!(
                    desc.requires_confirmation,
                    "{} is high danger but unconfirmed",
                    desc.name
                );
            }
        }
    }

    #[test]
    fn test_intent_tool_map() {
        assert_eq!(tools_for_intent("network_scanning")[0], "nmap");
        assert!(tools_for_intent("chitchat").is_empty());
    }
}
