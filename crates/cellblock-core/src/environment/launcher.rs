//! Restricted launcher script run by the child interpreter.
//!
//! The launcher compiles the user source while the full builtins are still
//! available, then hands the code object a namespace whose builtins have been
//! stripped and whose `__import__` refuses blocked modules. An allowed import
//! yields a filtered copy of the module: private names and anything bound to
//! a blocked module are left out, so preloaded modules cannot be used as a
//! path to `os` or `sys`. Blocked entries in `sys.modules` are replaced with
//! `None` for the duration of the run and restored afterwards, so interpreter
//! shutdown still finds what it expects.
//!
//! Everything runs inside one function whose locals are deleted before user
//! code starts. While user code runs, the launcher module's own globals point
//! at the restricted builtins too, so walking frames back from user code
//! finds nothing more. Launcher frames are dropped from printed tracebacks.
//! Functions keep the builtins they were defined with, which needs Python
//! 3.10 or newer.

use crate::config::{AnalysisConfig, EnvironmentConfig};

/// Launcher file name inside the scratch directory
pub const LAUNCHER_FILE: &str = "launcher.py";

/// User source file name inside the scratch directory
pub const SOURCE_FILE: &str = "code.py";

const LAUNCHER_TEMPLATE: &str = r#"def _launch():
    import sys
    import builtins

    def restricted_builtins(builtins, blocked, stripped):
        real_import = builtins.__import__
        module_type = type(builtins)

        def is_blocked(name):
            return isinstance(name, str) and name.partition('.')[0] in blocked

        def origin(value):
            try:
                return getattr(value, '__module__', None)
            except Exception:
                return None

        def view(module, seen):
            name = getattr(module, '__name__', '')
            if name in seen:
                return seen[name]
            copy = module_type(name)
            seen[name] = copy
            for key, value in list(vars(module).items()):
                if key.startswith('_'):
                    continue
                if isinstance(value, module_type):
                    if is_blocked(getattr(value, '__name__', '')):
                        continue
                    value = view(value, seen)
                elif is_blocked(origin(value)):
                    continue
                setattr(copy, key, value)
            return copy

        def guarded_import(name, globals=None, locals=None, fromlist=(), level=0):
            if level == 0 and is_blocked(name):
                raise ImportError("import of '%s' is not allowed" % name)
            for item in fromlist or ():
                if isinstance(item, str) and item.startswith('_'):
                    raise ImportError("import of '%s' from '%s' is not allowed" % (item, name))
            return view(real_import(name, globals, locals, fromlist, level), {})

        table = dict(vars(builtins))
        for name in stripped:
            table.pop(name, None)
        table['__import__'] = guarded_import
        return table

    def seal(sys, blocked, preload, limit, scope, table):
        for name in preload:
            try:
                __import__(name)
            except ImportError:
                pass
        saved = {name: sys.modules.get(name) for name in blocked}
        for name in blocked:
            sys.modules[name] = None
        default_limit = sys.getrecursionlimit()
        sys.setrecursionlimit(limit)
        real_builtins = scope['__builtins__']
        scope['__builtins__'] = table

        def restore():
            scope['__builtins__'] = real_builtins
            sys.setrecursionlimit(default_limit)
            for name, module in saved.items():
                if module is None:
                    sys.modules.pop(name, None)
                else:
                    sys.modules[name] = module

        return restore

    def report(failure, tb):
        import sys
        import traceback
        frames = [f for f in traceback.extract_tb(tb) if f.filename != __file__]
        lines = traceback.format_list(frames) + traceback.format_exception_only(type(failure), failure)
        if frames:
            lines.insert(0, 'Traceback (most recent call last):\n')
        sys.stderr.write(''.join(lines))
        sys.stderr.flush()

    source_file = sys.argv[1]
    with open(source_file, 'r', encoding='utf-8') as handle:
        source = handle.read()
    try:
        code = compile(source, source_file, 'exec')
    except (SyntaxError, ValueError) as exc:
        report(exc, None)
        raise SystemExit(1)

    blocked = frozenset({{BLOCKED_MODULES}})
    namespace = {
        '__name__': '__main__',
        '__builtins__': restricted_builtins(builtins, blocked, {{STRIPPED_BUILTINS}}),
    }
    restore = seal(sys, blocked, {{PRELOAD_MODULES}}, {{RECURSION_LIMIT}}, globals(), namespace['__builtins__'])
    del sys, builtins, blocked, restricted_builtins, seal, source, source_file, handle

    failure = None
    try:
        exec(code, namespace)
    except SystemExit:
        raise
    except BaseException as exc:
        failure = exc
    finally:
        restore()
    if failure is not None:
        report(failure, failure.__traceback__)
        raise SystemExit(1)


_launch()
"#;

/// Render the launcher for one configuration
///
/// Name lists are rendered as JSON arrays, which are valid Python list
/// literals for any string content.
pub fn render(analysis: &AnalysisConfig, environment: &EnvironmentConfig) -> String {
    LAUNCHER_TEMPLATE
        .replace(
            "{{BLOCKED_MODULES}}",
            &python_list(&analysis.blocked_modules),
        )
        .replace(
            "{{PRELOAD_MODULES}}",
            &python_list(&environment.preload_modules),
        )
        .replace(
            "{{STRIPPED_BUILTINS}}",
            &python_list(&environment.stripped_builtins),
        )
        .replace(
            "{{RECURSION_LIMIT}}",
            &environment.recursion_limit.to_string(),
        )
}

fn python_list(names: &[String]) -> String {
    let quoted: Vec<String> = names
        .iter()
        .map(|name| serde_json::Value::String(name.clone()).to_string())
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_every_placeholder() {
        let script = render(&AnalysisConfig::default(), &EnvironmentConfig::default());
        assert!(!script.contains("{{"));
        assert!(script.contains(", 100, globals(),"));
        assert!(script.contains("def guarded_import"));
        assert!(script.contains(r#""os""#));
        assert!(script.contains(r#""math""#));
    }

    #[test]
    fn test_render_escapes_names() {
        let mut analysis = AnalysisConfig::default();
        analysis.blocked_modules = vec!["a'b\"c".to_string()];
        let script = render(&analysis, &EnvironmentConfig::default());
        assert!(script.contains(r#"frozenset(["a'b\"c"])"#));
    }

    #[test]
    fn test_launcher_runs_inside_one_function() {
        let script = render(&AnalysisConfig::default(), &EnvironmentConfig::default());
        let top_level: Vec<&str> = script
            .lines()
            .filter(|line| !line.is_empty() && !line.starts_with(' '))
            .collect();
        assert_eq!(top_level, ["def _launch():", "_launch()"]);
        assert!(script.contains("del sys, builtins, blocked"));
    }

    #[test]
    fn test_python_list() {
        assert_eq!(python_list(&[]), "[]");
        assert_eq!(
            python_list(&["os".to_string(), "sys".to_string()]),
            r#"["os", "sys"]"#
        );
    }
}
