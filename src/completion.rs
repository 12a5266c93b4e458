//! Command and argument completion
//!
//! Kickstart lines start with a command followed by its options, so the
//! first word on the line decides what to offer: before it is complete every
//! command is a candidate, afterwards the options of that command are.

use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind, InsertTextFormat};

/// A kickstart command and the argument snippets offered after it.
#[derive(Debug, Clone, Copy)]
pub struct KickstartCommand {
    pub name: &'static str,
    pub detail: &'static str,
    pub arguments: &'static [&'static str],
}

const fn command(
    name: &'static str,
    detail: &'static str,
    arguments: &'static [&'static str],
) -> KickstartCommand {
    KickstartCommand {
        name,
        detail,
        arguments,
    }
}

/// Known commands, in the order they are offered.
pub static COMMANDS: &[KickstartCommand] = &[
    command("authselect", "Configure authentication", &["${1:options}"]),
    command(
        "autopart",
        "Create partitions automatically",
        &[
            "--type=${1|lvm,btrfs,plain,thinp|}",
            "--fstype=${1:xfs}",
            "--nohome",
            "--noboot",
            "--noswap",
            "--encrypted",
            "--passphrase=${1:passphrase}",
            "--luks-version=${1|luks1,luks2|}",
        ],
    ),
    command(
        "bootloader",
        "Configure the boot loader",
        &[
            "--location=${1|mbr,partition,none,boot|}",
            "--append=\"${1:args}\"",
            "--boot-drive=${1:drive}",
            "--driveorder=${1:drives}",
            "--iscrypted",
            "--password=${1:password}",
            "--timeout=${1:5}",
            "--leavebootorder",
        ],
    ),
    command("cdrom", "Install from the first optical drive", &[]),
    command(
        "clearpart",
        "Remove partitions before partitioning",
        &[
            "--all",
            "--drives=${1:drives}",
            "--initlabel",
            "--linux",
            "--none",
            "--list=${1:partitions}",
            "--disklabel=${1|gpt,msdos|}",
        ],
    ),
    command(
        "firewall",
        "Configure the firewall",
        &[
            "--enabled",
            "--disabled",
            "--service=${1:ssh}",
            "--port=${1:port}:${2|tcp,udp|}",
            "--trust=${1:device}",
            "--use-system-defaults",
        ],
    ),
    command("firstboot", "Configure Initial Setup", &["--enable", "--disable", "--reconfig"]),
    command("graphical", "Run the installation in graphical mode", &["--non-interactive"]),
    command("ignoredisk", "Ignore disks during installation", &["--drives=${1:drives}", "--only-use=${1:drives}"]),
    command("keyboard", "Set the keyboard layout", &["--vckeymap=${1:us}", "--xlayouts=${1:us}", "--switch=${1:options}"]),
    command("lang", "Set the system language", &["${1:en_US.UTF-8}", "--addsupport=${1:locales}"]),
    command(
        "logvol",
        "Create a logical volume",
        &[
            "${1:mountpoint}",
            "--vgname=${1:name}",
            "--name=${1:name}",
            "--size=${1:size}",
            "--grow",
            "--maxsize=${1:size}",
            "--fstype=${1:xfs}",
            "--percent=${1:percent}",
        ],
    ),
    command(
        "network",
        "Configure network devices",
        &[
            "--bootproto=${1|dhcp,static,ibft|}",
            "--device=${1:device}",
            "--ip=${1:address}",
            "--netmask=${1:netmask}",
            "--gateway=${1:gateway}",
            "--nameserver=${1:nameserver}",
            "--hostname=${1:hostname}",
            "--onboot=${1|yes,no|}",
            "--activate",
            "--noipv6",
        ],
    ),
    command(
        "part",
        "Create a partition",
        &[
            "${1:mountpoint}",
            "--size=${1:size}",
            "--grow",
            "--maxsize=${1:size}",
            "--ondisk=${1:disk}",
            "--fstype=${1:xfs}",
            "--asprimary",
            "--encrypted",
            "--label=${1:label}",
        ],
    ),
    command("poweroff", "Power off after installation", &[]),
    command(
        "raid",
        "Create a software RAID device",
        &["${1:mountpoint}", "--level=${1|0,1,4,5,6,10|}", "--device=${1:name}", "--fstype=${1:xfs}", "--spares=${1:count}"],
    ),
    command("reboot", "Reboot after installation", &["--eject", "--kexec"]),
    command("repo", "Add an installation repository", &["--name=${1:name}", "--baseurl=${1:url}", "--mirrorlist=${1:url}", "--cost=${1:cost}", "--install"]),
    command("rootpw", "Set the root password", &["--iscrypted", "--plaintext", "--lock", "--allow-ssh", "${1:password}"]),
    command("selinux", "Set the SELinux mode", &["--enforcing", "--permissive", "--disabled"]),
    command("services", "Enable or disable services", &["--enabled=${1:services}", "--disabled=${1:services}"]),
    command("shutdown", "Shut down after installation", &[]),
    command("skipx", "Do not configure X", &[]),
    command("sshkey", "Add an authorized SSH key", &["--username=${1:user}", "\"${1:key}\""]),
    command("text", "Run the installation in text mode", &["--non-interactive"]),
    command("timezone", "Set the system time zone", &["${1:America/New_York}", "--utc", "--nontp", "--ntpservers=${1:servers}"]),
    command("url", "Install from a remote server", &["--url=${1:url}", "--mirrorlist=${1:url}", "--proxy=${1:proxy}", "--noverifyssl"]),
    command(
        "user",
        "Create a user",
        &[
            "--name=${1:name}",
            "--groups=${1:groups}",
            "--homedir=${1:path}",
            "--password=${1:password}",
            "--iscrypted",
            "--shell=${1:/bin/bash}",
            "--uid=${1:uid}",
            "--gecos=\"${1:comment}\"",
        ],
    ),
    command("volgroup", "Create an LVM volume group", &["${1:name}", "${2:partitions}", "--pesize=${1:size}", "--useexisting", "--noformat"]),
    command("zerombr", "Initialize invalid partition tables", &[]),
    command("%packages", "Start the package selection section", &["--ignoremissing", "--nocore", "--excludedocs", "--instLangs=${1:languages}"]),
    command("%pre", "Start a pre-installation script", &["--interpreter=${1:/bin/sh}", "--erroronfail", "--log=${1:path}"]),
    command("%post", "Start a post-installation script", &["--nochroot", "--interpreter=${1:/bin/sh}", "--erroronfail", "--log=${1:path}"]),
    command("%end", "End the current section", &[]),
];

/// Look up a command by name.
pub fn find_command(name: &str) -> Option<&'static KickstartCommand> {
    COMMANDS.iter().find(|c| c.name == name)
}

/// Label shown for an argument snippet: its first word.
pub fn argument_label(argument: &str) -> &str {
    argument.split_whitespace().next().unwrap_or(argument)
}

/// Completion items for the text of a line before the cursor.
pub fn complete(line_prefix: &str) -> Vec<CompletionItem> {
    // The first word is complete once a non-space is followed by whitespace
    let has_command = line_prefix.trim_start().contains(char::is_whitespace);

    if has_command {
        let Some(word) = line_prefix.split_whitespace().next() else {
            return Vec::new();
        };
        return match find_command(word) {
            Some(command) => command.arguments.iter().map(|&arg| argument_item(arg)).collect(),
            None => Vec::new(),
        };
    }

    COMMANDS.iter().map(command_item).collect()
}

fn command_item(command: &KickstartCommand) -> CompletionItem {
    CompletionItem {
        label: command.name.to_string(),
        kind: Some(CompletionItemKind::FUNCTION),
        detail: Some(command.detail.to_string()),
        ..Default::default()
    }
}

fn argument_item(argument: &str) -> CompletionItem {
    CompletionItem {
        label: argument_label(argument).to_string(),
        kind: Some(CompletionItemKind::PROPERTY),
        insert_text: Some(argument.to_string()),
        insert_text_format: Some(InsertTextFormat::SNIPPET),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commands_offered_for_first_word() {
        let items = complete("");
        assert_eq!(items.len(), COMMANDS.len());
        assert!(items
            .iter()
            .all(|i| i.kind == Some(CompletionItemKind::FUNCTION)));

        let items = complete("   boot");
        assert_eq!(items.len(), COMMANDS.len());
    }

    #[test]
    fn test_arguments_offered_after_command() {
        let items = complete("bootloader ");
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert!(labels.contains(&"--location=${1|mbr,partition,none,boot|}"));
        assert!(labels.contains(&"--leavebootorder"));
        assert!(items
            .iter()
            .all(|i| i.kind == Some(CompletionItemKind::PROPERTY)));
        assert_eq!(
            items[0].insert_text.as_deref(),
            Some("--location=${1|mbr,partition,none,boot|}")
        );
    }

    #[test]
    fn test_unknown_command_has_no_arguments() {
        assert!(complete("bootlaoder --").is_empty());
    }

    #[test]
    fn test_argument_label() {
        assert_eq!(argument_label("--size=${1:size}"), "--size=${1:size}");
        assert_eq!(argument_label("--grow"), "--grow");
        assert_eq!(argument_label("${1:mountpoint}"), "${1:mountpoint}");
        assert_eq!(argument_label("--device=${1:dev} --activate"), "--device=${1:dev}");
        assert_eq!(argument_label("--append=\"${1:args}\""), "--append=\"${1:args}\"");
    }

    #[test]
    fn test_command_names_unique() {
        for (i, a) in COMMANDS.iter().enumerate() {
            assert!(
                COMMANDS[i + 1..].iter().all(|b| b.name != a.name),
                "duplicate command {}",
                a.name
            );
        }
    }
}
