//! Environment checks (distribution family, disk, network, locks).

use std::fs;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::process::Cmd;
use crate::source;

use super::types::CheckResult;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Check the host environment the run will mutate.
pub fn check_environment(config: &Config) -> Vec<CheckResult> {
    let mut results = Vec::new();

    results.push(check_os_family());
    results.push(check_clone_destination(config));
    if let Some(check) = check_existing_clone(config) {
        results.push(check);
    }
    if let Some(check) = check_disk_space(config) {
        results.push(check);
    }
    results.push(check_network(config));
    if let Some(check) = check_dpkg_lock() {
        results.push(check);
    }

    results
}

/// apt provisioning only works on Debian-family systems.
fn check_os_family() -> CheckResult {
    match fs::read_to_string("/etc/os-release") {
        Ok(contents) => {
            let (id, id_like) = parse_os_release(&contents);
            let shown = id.as_deref().unwrap_or("unknown");
            if is_debian_family(id.as_deref(), id_like.as_deref()) {
                CheckResult::pass_with("distribution", shown)
            } else {
                CheckResult::fail(
                    "distribution",
                    &format!("'{}' is not apt-based; realprep needs Debian or Ubuntu", shown),
                )
            }
        }
        Err(_) => CheckResult::warn(
            "distribution",
            "/etc/os-release not readable; cannot confirm apt-based system",
        ),
    }
}

/// Pull ID and ID_LIKE out of os-release contents.
pub fn parse_os_release(contents: &str) -> (Option<String>, Option<String>) {
    let mut id = None;
    let mut id_like = None;
    for line in contents.lines() {
        if let Some(value) = line.strip_prefix("ID=") {
            id = Some(value.trim_matches('"').to_string());
        } else if let Some(value) = line.strip_prefix("ID_LIKE=") {
            id_like = Some(value.trim_matches('"').to_string());
        }
    }
    (id, id_like)
}

pub fn is_debian_family(id: Option<&str>, id_like: Option<&str>) -> bool {
    let hit = |value: &str| {
        value
            .split_whitespace()
            .any(|word| word == "debian" || word == "ubuntu")
    };
    id.map(hit).unwrap_or(false) || id_like.map(hit).unwrap_or(false)
}

/// The clone destination (or its parent) must be writable before the
/// run gets anywhere near git.
fn check_clone_destination(config: &Config) -> CheckResult {
    if config.source_override.is_some() {
        return CheckResult::skip("clone destination", "REALSENSE_SOURCE override set");
    }

    let probe_dir = if config.clone_dir.is_dir() {
        config.clone_dir.clone()
    } else {
        match config.clone_dir.parent() {
            Some(parent) => {
                if !parent.exists() {
                    if let Err(e) = fs::create_dir_all(parent) {
                        return CheckResult::fail(
                            "clone destination",
                            &format!("Cannot create {}: {}", parent.display(), e),
                        );
                    }
                }
                parent.to_path_buf()
            }
            None => PathBuf::from("/"),
        }
    };

    let test_file = probe_dir.join(".preflight-test");
    match fs::write(&test_file, "test") {
        Ok(_) => {
            let _ = fs::remove_file(&test_file);
            CheckResult::pass_with("clone destination", &config.clone_dir.to_string_lossy())
        }
        Err(e) => CheckResult::fail(
            "clone destination",
            &format!("Cannot write under {}: {}", probe_dir.display(), e),
        ),
    }
}

/// A leftover directory that is not a source tree would make git refuse
/// to clone into it.
fn check_existing_clone(config: &Config) -> Option<CheckResult> {
    if config.source_override.is_some() || !config.clone_dir.exists() {
        return None;
    }
    if source::is_sdk_tree(&config.clone_dir) {
        Some(CheckResult::pass_with(
            "existing clone",
            &format!("{} will be reused", config.clone_dir.display()),
        ))
    } else {
        Some(CheckResult::fail(
            "existing clone",
            &format!(
                "{} exists but is not a librealsense tree; run 'realprep clean source'",
                config.clone_dir.display()
            ),
        ))
    }
}

/// Check disk space under the clone destination (warn if < 5GB free).
fn check_disk_space(config: &Config) -> Option<CheckResult> {
    let target = nearest_existing(config.source_dir());
    let result = Cmd::new("df")
        .args(["--output=avail", "-B1"])
        .arg(target.to_string_lossy().as_ref())
        .allow_fail()
        .run()
        .ok()?;
    if !result.success() {
        return None;
    }

    // Skip header line, get available bytes
    let avail_str = result.stdout.lines().nth(1)?;
    let avail_bytes: u64 = avail_str.trim().parse().ok()?;
    let free_gb = avail_bytes / (1024 * 1024 * 1024);
    if free_gb < 5 {
        Some(CheckResult::warn(
            "disk space",
            &format!("{}GB free - SDK clone and build need several GB", free_gb),
        ))
    } else {
        Some(CheckResult::pass_with(
            "disk space",
            &format!("{}GB free", free_gb),
        ))
    }
}

/// Closest existing ancestor of a path (the path itself if present).
fn nearest_existing(path: &Path) -> &Path {
    let mut current = path;
    loop {
        if current.exists() {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return Path::new("/"),
        }
    }
}

/// Reachability of the git host, skipped when the source is already on
/// disk. apt mirrors are not probed; apt reports its own failures fast.
fn check_network(config: &Config) -> CheckResult {
    if source::find_existing(config).is_some() {
        return CheckResult::skip("network", "SDK source already on disk");
    }

    let Some(host) = git_host(&config.git_url) else {
        return CheckResult::fail(
            "network",
            &format!("Cannot parse host from REALSENSE_GIT_URL '{}'", config.git_url),
        );
    };

    let name = format!("network ({}:443)", host);
    let addrs = match (host.as_str(), 443).to_socket_addrs() {
        Ok(addrs) => addrs.collect::<Vec<_>>(),
        Err(e) => {
            return CheckResult::fail(&name, &format!("DNS resolution failed: {}", e));
        }
    };
    let Some(addr) = addrs.first() else {
        return CheckResult::fail(&name, "DNS returned no addresses");
    };

    match TcpStream::connect_timeout(addr, CONNECT_TIMEOUT) {
        Ok(_) => CheckResult::pass(&name),
        Err(e) => CheckResult::fail(&name, &format!("Cannot connect: {}", e)),
    }
}

/// Host part of a clone URL, for the reachability probe.
pub fn git_host(url: &str) -> Option<String> {
    if let Some(rest) = url.split_once("://").map(|(_, rest)| rest) {
        let host = rest.split('/').next()?;
        let host = host.rsplit('@').next()?;
        return Some(host.split(':').next()?.to_string());
    }
    // scp-style: git@github.com:owner/repo.git
    if let Some((user_host, _)) = url.split_once(':') {
        let host = user_host.rsplit('@').next()?;
        if !host.is_empty() && !host.contains('/') {
            return Some(host.to_string());
        }
    }
    None
}

/// Another package manager holding the dpkg lock would make the apt
/// steps fail immediately. Only checked when fuser is available.
fn check_dpkg_lock() -> Option<CheckResult> {
    if !crate::process::exists("fuser") {
        return None;
    }
    let result = Cmd::new("fuser")
        .arg("/var/lib/dpkg/lock-frontend")
        .allow_fail()
        .run()
        .ok()?;
    // fuser exits 0 when a process holds the file
    if result.success() {
        Some(CheckResult::warn(
            "dpkg lock",
            "Another package manager appears to be running",
        ))
    } else {
        Some(CheckResult::pass("dpkg lock"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_os_release_ubuntu() {
        let contents = "NAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\nVERSION_ID=\"22.04\"\n";
        let (id, id_like) = parse_os_release(contents);
        assert_eq!(id.as_deref(), Some("ubuntu"));
        assert_eq!(id_like.as_deref(), Some("debian"));
        assert!(is_debian_family(id.as_deref(), id_like.as_deref()));
    }

    #[test]
    fn test_parse_os_release_debian() {
        let contents = "ID=debian\n";
        let (id, id_like) = parse_os_release(contents);
        assert!(is_debian_family(id.as_deref(), id_like.as_deref()));
    }

    #[test]
    fn test_os_family_rejects_fedora() {
        let contents = "ID=fedora\nID_LIKE=\"rhel centos\"\n";
        let (id, id_like) = parse_os_release(contents);
        assert!(!is_debian_family(id.as_deref(), id_like.as_deref()));
    }

    #[test]
    fn test_os_family_accepts_derivative_via_id_like() {
        let contents = "ID=linuxmint\nID_LIKE=\"ubuntu debian\"\n";
        let (id, id_like) = parse_os_release(contents);
        assert!(is_debian_family(id.as_deref(), id_like.as_deref()));
    }

    #[test]
    fn test_git_host_https() {
        assert_eq!(
            git_host("https://github.com/IntelRealSense/librealsense.git").as_deref(),
            Some("github.com")
        );
    }

    #[test]
    fn test_git_host_scp_style() {
        assert_eq!(
            git_host("git@github.com:IntelRealSense/librealsense.git").as_deref(),
            Some("github.com")
        );
    }

    #[test]
    fn test_git_host_rejects_garbage() {
        assert_eq!(git_host("not a url"), None);
    }

    #[test]
    fn test_nearest_existing_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let deep = dir.path().join("a").join("b").join("c");
        assert_eq!(nearest_existing(&deep), dir.path());
        assert_eq!(nearest_existing(dir.path()), dir.path());
    }
}
