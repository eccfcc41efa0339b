//! Starter catalog written on first launch.

use crate::command::Command;

fn entry(id: &str, name: &str, command: &str, category: &str, description: &str, tags: &[&str]) -> Command {
    Command::new(id, name, command)
        .with_category(category)
        .with_description(description)
        .with_tags(tags.iter().copied())
}

/// Starter entries for the operating system named by `os`
/// (`std::env::consts::OS` spelling).
pub fn default_catalog(os: &str) -> Vec<Command> {
    match os {
        "macos" => macos_catalog(),
        _ => linux_catalog(),
    }
}

fn macos_catalog() -> Vec<Command> {
    vec![
        entry("1", "Disk Space", "df -h", "System", "Shows disk space usage", &["system", "disk"]),
        entry("2", "Memory Usage", "vm_stat", "System", "Shows virtual memory statistics", &["system", "memory"]),
        entry("3", "Network Interfaces", "ifconfig", "Network", "Lists network interfaces", &["network"]),
        entry(
            "4",
            "System Info",
            "system_profiler SPSoftwareDataType SPHardwareDataType",
            "System",
            "Shows system hardware and software information",
            &["system", "hardware"],
        ),
        entry("5", "Running Processes", "ps aux", "System", "Shows all running processes", &["system", "process"]),
        entry("6", "Network Stats", "netstat -an", "Network", "Shows network statistics", &["network"]),
        entry(
            "7",
            "CPU Info",
            "sysctl -n machdep.cpu.brand_string",
            "System",
            "Shows CPU information",
            &["system", "cpu"],
        ),
    ]
}

fn linux_catalog() -> Vec<Command> {
    vec![
        entry("1", "Disk Space", "df -h", "System", "Shows disk space usage", &["system", "disk"]),
        entry("2", "Memory Usage", "free -h", "System", "Shows memory usage", &["system", "memory"]),
        entry("3", "Network Interfaces", "ip addr", "Network", "Lists network interfaces", &["network"]),
        entry("4", "System Info", "uname -a", "System", "Shows system information", &["system"]),
        entry("5", "Running Processes", "ps aux", "System", "Shows all running processes", &["system", "process"]),
        entry("6", "Listening Sockets", "ss -tuln", "Network", "Shows listening sockets", &["network"]),
        entry("7", "CPU Info", "lscpu", "System", "Shows CPU information", &["system", "cpu"]),
    ]
}
