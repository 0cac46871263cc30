//! Tera rendering engine: [`Renderer`].
//!
//! The wrapper template is embedded at compile time and has exactly one
//! per-executable substitution point (the target). The shell and marker are
//! fixed for the lifetime of a [`Renderer`].

use std::path::{Path, PathBuf};

use tera::Tera;

use crate::context::WrapperContext;
use crate::error::RenderError;

const WRAPPER_TEMPLATE: &str = "wrapper.sh";

const TPLS: &[(&str, &str)] = &[(WRAPPER_TEMPLATE, include_str!("templates/wrapper.sh.tera"))];

fn build_tera() -> Result<Tera, RenderError> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    tera.add_raw_templates(TPLS.iter().copied())?;
    Ok(tera)
}

/// Renders wrapper scripts for one configured shell.
///
/// Create once per run with [`Renderer::new`] and reuse.
pub struct Renderer {
    tera: Tera,
    shell: PathBuf,
}

impl Renderer {
    pub fn new(shell: &Path) -> Result<Self, RenderError> {
        Ok(Renderer {
            tera: build_tera()?,
            shell: shell.to_path_buf(),
        })
    }

    /// Interpreter written into every shebang.
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// Wrapper content forwarding to `target`.
    ///
    /// Pure: the same `target` always yields byte-identical output, LF line
    /// endings, exactly one trailing newline.
    pub fn render(&self, target: &Path) -> Result<String, RenderError> {
        let ctx = WrapperContext::new(&self.shell, target)?;
        let rendered = self.tera.render(WRAPPER_TEMPLATE, &ctx.to_tera_context()?)?;
        let mut content = rendered.trim_end().to_string();
        content.push('\n');
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::marker::{parse_wrapper, MARKER_VERSION};

    fn renderer() -> Renderer {
        Renderer::new(Path::new("/system/bin/sh")).expect("renderer")
    }

    #[test]
    fn renders_expected_script() {
        let content = renderer()
            .render(Path::new("/data/adb/python/bin/python3"))
            .unwrap();
        assert_eq!(
            content,
            "#!/system/bin/sh\n\
             # pyshim-wrapper v1: generated by pyshim, do not edit\n\
             exec '/data/adb/python/bin/python3' \"$@\"\n"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let r = renderer();
        let target = Path::new("/data/adb/python/bin/pip");
        assert_eq!(r.render(target).unwrap(), r.render(target).unwrap());
    }

    #[test]
    fn rendered_output_parses_back_to_its_target() {
        let r = renderer();
        for target in [
            "/data/adb/python/bin/pip3",
            "/opt/with space/tool",
            "/opt/it's/quoted",
            "/opt/$HOME/`cmd`/x",
        ] {
            let content = r.render(Path::new(target)).unwrap();
            let info = parse_wrapper(&content)
                .unwrap_or_else(|e| panic!("rendered wrapper for {target} not owned: {e}"));
            assert_eq!(info.target, PathBuf::from(target));
            assert_eq!(info.shell, PathBuf::from("/system/bin/sh"));
            assert_eq!(info.version, MARKER_VERSION);
        }
    }

    #[test]
    fn no_crlf_in_rendered_output() {
        let content = renderer().render(Path::new("/opt/tool")).unwrap();
        assert!(!content.contains('\r'));
        assert!(content.ends_with("\"$@\"\n"));
    }

    #[test]
    fn newline_in_target_is_an_error() {
        let r = renderer();
        for target in ["/opt/bin/a\nb", "/opt/bin/c\r\nd"] {
            let err = r.render(Path::new(target)).unwrap_err();
            assert!(matches!(err, RenderError::ControlCharacter(_)), "{target:?}");
        }
    }

    #[test]
    fn relative_target_is_an_error() {
        let err = renderer().render(Path::new("tool")).unwrap_err();
        assert!(matches!(err, RenderError::RelativePath(_)));
    }
}
