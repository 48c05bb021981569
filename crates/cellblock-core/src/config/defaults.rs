//! Default denylists and heuristic tables.

use super::SuspiciousPattern;

/// Modules rejected by the import denylist and neutered in the launcher
pub fn default_blocked_modules() -> Vec<String> {
    [
        // Filesystem and OS access
        "os",
        "posix",
        "nt",
        "pwd",
        "grp",
        "sys",
        "shutil",
        "pathlib",
        "glob",
        "tempfile",
        "io",
        "_io",
        "fcntl",
        "mmap",
        "resource",
        // Process control
        "subprocess",
        "_posixsubprocess",
        "multiprocessing",
        "threading",
        "_thread",
        "concurrent",
        "asyncio",
        "signal",
        "_signal",
        "pty",
        // Networking
        "socket",
        "_socket",
        "ssl",
        "urllib",
        "requests",
        "http",
        "ftplib",
        "smtplib",
        "poplib",
        "imaplib",
        "telnetlib",
        // Introspection and reflection
        "ctypes",
        "_ctypes",
        "importlib",
        "builtins",
        "inspect",
        "gc",
        "code",
        "codeop",
        "traceback",
        "linecache",
        // Object reconstruction
        "pickle",
        "_pickle",
        "marshal",
        "shelve",
        // Crypto and randomness
        "hashlib",
        "secrets",
        "random",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Builtins rejected by the callable denylist
pub fn default_blocked_callables() -> Vec<String> {
    [
        "exec",
        "eval",
        "compile",
        "__import__",
        "getattr",
        "setattr",
        "delattr",
        "hasattr",
        "globals",
        "locals",
        "vars",
        "dir",
        "help",
        "input",
        "raw_input",
        "exit",
        "quit",
        "reload",
        "open",
        "file",
        "breakpoint",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Statement-level patterns checked after the two denylists
pub fn default_blocked_text_patterns() -> Vec<String> {
    [
        r"import\s+os",
        r"import\s+sys",
        r"import\s+subprocess",
        r"from\s+os\s+import",
        r"from\s+sys\s+import",
        r"__import__\s*\(",
        r"\bexec\s*\(",
        r"\beval\s*\(",
        r"\bcompile\s*\(",
        r"\bopen\s*\(",
        r"\bgetattr\s*\(",
        r"\bsetattr\s*\(",
        r"\bglobals\s*\(",
        r"\blocals\s*\(",
        r"\bvars\s*\(",
        // Dunder access is the usual route out of a stripped namespace
        r"__\w+__",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Content heuristics that suggest obfuscation or host access
pub fn default_suspicious_patterns() -> Vec<SuspiciousPattern> {
    vec![
        SuspiciousPattern::new(r"base64|b64", "Base64 encoding detected"),
        SuspiciousPattern::new(r"https?://|ftp://", "Network access attempt detected"),
        SuspiciousPattern::new(
            r"/[a-zA-Z]:/|\.\./|\.\.\\",
            "File system access attempt detected",
        ),
        SuspiciousPattern::new(
            r"\b(cmd|shell|bash|sh|powershell)\b",
            "Shell command attempt detected",
        ),
    ]
}

/// Builtins removed from the namespace the launcher hands to user code
pub fn default_stripped_builtins() -> Vec<String> {
    [
        "exec",
        "eval",
        "compile",
        "getattr",
        "setattr",
        "delattr",
        "hasattr",
        "globals",
        "locals",
        "vars",
        "dir",
        "help",
        "input",
        "exit",
        "quit",
        "open",
        "breakpoint",
        "memoryview",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Stdlib modules imported by the launcher before the module table is
/// neutered, so their own internal imports still resolve
///
/// User code only ever sees filtered copies of these: private names and
/// anything bound to a blocked module are left out.
pub fn default_preload_modules() -> Vec<String> {
    [
        "math",
        "cmath",
        "json",
        "re",
        "string",
        "collections",
        "itertools",
        "functools",
        "operator",
        "datetime",
        "statistics",
        "fractions",
        "decimal",
        "dataclasses",
        "enum",
        "typing",
        "heapq",
        "bisect",
        "textwrap",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
