// file: src/runner/parsers.rs
// version: 1.0.0
// guid: 9f2a6c58-d431-4be7-a0d9-16e58c3f74b2

//! Tool output parsers
//!
//! Line-oriented extraction of structured findings from raw tool output.
//! Deliberately forgiving: scanners interleave banners and progress lines
//! with results, so anything that does not match is skipped.

use serde::{Deserialize, Serialize};

/// A single open port reported by a scanner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPort {
    pub port: u16,
    pub service: String,
}

/// Structured findings extracted from tool output
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Findings {
    OpenPorts { ports: Vec<OpenPort>, total: usize },
    WebVulnerabilities { entries: Vec<String>, total: usize },
}

/// Parse findings from a tool's stdout, when the tool has a parser
pub fn parse_findings(tool: &str, stdout: &str) -> Option<Findings> {
    match tool {
        "nmap" | "masscan" => Some(parse_port_scan(stdout)),
        "nikto" => Some(parse_nikto(stdout)),
        _ => None,
    }
}

/// Extract open ports from nmap-style grepable lines: `22/tcp open ssh`
fn parse_port_scan(stdout: &str) -> Findings {
    let mut ports = Vec::new();

    for line in stdout.lines() {
        if !line.contains("/tcp") || !line.contains("open") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(spec) = parts.first() else { continue };
        let Some(number) = spec.split('/').next() else { continue };
        let Ok(port) = number.parse::<u16>() else { continue };

        ports.push(OpenPort {
            port,
            service: parts.get(2).unwrap_or(&"unknown").to_string(),
        });
    }

    let total = ports.len();
    Findings::OpenPorts { ports, total }
}

/// Extract OSVDB-referenced findings from nikto output
fn parse_nikto(stdout: &str) -> Findings {
    let entries: Vec<String> = stdout
        .lines()
        .filter(|line| line.contains("+ ") && line.contains("OSVDB"))
        .map(|line| line.trim().to_string())
        .collect();

    let total = entries.len();
    Findings::WebVulnerabilities { entries, total }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nmap_open_ports() {
        let output = "\
Starting Nmap 7.94 ( https://nmap.org )
Nmap scan report for 203.0.113.5
PORT     STATE  SERVICE  VERSION
22/tcp   open   ssh      OpenSSH 9.3
80/tcp   open   http     nginx 1.24.0
443/tcp  closed https
Nmap done: 1 IP address (1 host up) scanned in 4.31 seconds
";
        let Some(Findings::OpenPorts { ports, total }) = parse_findings("nmap", output) else {
            panic!("expected open ports");
        };
        assert_eq!(total, 2);
        assert_eq!(ports[0], OpenPort { port: 22, service: "ssh".into() });
        assert_eq!(ports[1].port, 80);
    }

    #[test]
    fn test_nmap_no_open_ports() {
        let Some(Findings::OpenPorts { ports, total }) =
            parse_findings("nmap", "All 1000 scanned ports are closed")
        else {
            panic!("expected open ports");
        };
        assert!(ports.is_empty());
        assert_eq!(total, 0);
    }

    #[test]
    fn test_nikto_osvdb_entries() {
        let output = "\
- Nikto v2.5.0
+ Target IP: 203.0.113.5
+ OSVDB-3092: /admin/: This might be interesting.
+ OSVDB-3233: /icons/README: Apache default file found.
+ Scan terminated
";
        let Some(Findings::WebVulnerabilities { entries, total }) =
            parse_findings("nikto", output)
        else {
            panic!("expected web vulnerabilities");
        };
        assert_eq!(total, 2);
        assert!(entries[0].contains("OSVDB-3092"));
    }

    #[test]
    fn test_unparsed_tools_yield_none() {
        assert!(parse_findings("whois", "Domain Name: EXAMPLE.COM").is_none());
    }

    #[test]
    fn test_garbage_lines_are_skipped() {
        let output = "open/tcp nonsense\nnot-a-port/tcp open\n99999/tcp open x\n";
        let Some(Findings::OpenPorts { ports, .. }) = parse_findings("masscan", output) else {
            panic!("expected open ports");
        };
        assert!(ports.is_empty());
    }
}
