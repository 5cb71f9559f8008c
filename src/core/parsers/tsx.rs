use anyhow::{Result, anyhow};
use swc_common::{BytePos, FileName, SourceFile, SourceMap, comments::SingleThreadedComments, sync::Lrc};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

pub struct ParsedTsx {
    pub module: Module,
    pub source_map: SourceMap,
    pub comments: SingleThreadedComments,
    pub source: String,
    source_file: Lrc<SourceFile>,
}

impl ParsedTsx {
    /// Translate a global `BytePos` into a byte offset in `source`.
    ///
    /// The SourceMap allocates each file at a global base position, so raw
    /// span values cannot index the source string directly.
    pub fn offset_of(&self, pos: BytePos) -> usize {
        (pos.0 - self.source_file.start_pos.0) as usize
    }
}

/// Parse JSX/TSX source code string into an AST.
pub fn parse_tsx_source(code: String, file_path: &str) -> Result<ParsedTsx> {
    let source_map = SourceMap::default();
    let source_file =
        source_map.new_source_file(FileName::Real(file_path.into()).into(), code.clone());

    let syntax = Syntax::Typescript(TsSyntax {
        tsx: true,
        ..Default::default()
    });
    let comments = SingleThreadedComments::default();
    let mut parser = Parser::new(syntax, StringInput::from(&*source_file), Some(&comments));
    let module = parser
        .parse_module()
        .map_err(|e| anyhow!("Failed to parse tsx source: {:?}", e))?;
    Ok(ParsedTsx {
        module,
        source_map,
        comments,
        source: code,
        source_file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use swc_common::Spanned;

    #[test]
    fn test_parse_simple_component() {
        let code = r#"
export function App() {
  return <div title="hi">你好</div>;
}
"#;
        let parsed = parse_tsx_source(code.to_string(), "App.tsx").unwrap();
        assert_eq!(parsed.module.body.len(), 1);
        assert_eq!(parsed.source, code);
    }

    #[test]
    fn test_parse_error_reported() {
        let result = parse_tsx_source("const = ;;;<".to_string(), "broken.tsx");
        assert!(result.is_err());
    }

    #[test]
    fn test_offset_of_maps_spans_into_source() {
        let code = "const a = '确认';".to_string();
        let parsed = parse_tsx_source(code, "a.ts").unwrap();
        let item = &parsed.module.body[0];
        assert_eq!(parsed.offset_of(item.span().lo), 0);
    }
}
