//! Line/parameter model, tokenizer and writer.

use std::fmt;
use std::path::Path;

use botfield_logic::camera::CameraType;
use botfield_logic::object_type::ObjectType;

use super::error::LevelError;
use super::provider::LevelProvider;
use crate::math::{Color, Vec3};

/// One `name=value` pair, value kept as raw text
#[derive(Debug, Clone, PartialEq)]
pub struct LevelParam {
    pub name: String,
    pub raw: String,
}

impl LevelParam {
    pub fn new(name: &str, raw: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            raw: raw.into(),
        }
    }

    pub fn int(name: &str, v: i32) -> Self {
        Self::new(name, v.to_string())
    }

    pub fn float(name: &str, v: f32) -> Self {
        Self::new(name, format_float(v))
    }

    pub fn bool(name: &str, v: bool) -> Self {
        Self::new(name, if v { "1" } else { "0" })
    }

    pub fn string(name: &str, v: &str) -> Self {
        Self::new(name, format!("\"{}\"", v.replace('"', "'")))
    }

    pub fn point(name: &str, v: Vec3) -> Self {
        Self::new(
            name,
            format!("{};{};{}", format_float(v.x), format_float(v.y), format_float(v.z)),
        )
    }

    pub fn color(name: &str, v: Color) -> Self {
        Self::new(
            name,
            format!(
                "{};{};{};{}",
                format_float(v.r),
                format_float(v.g),
                format_float(v.b),
                format_float(v.a)
            ),
        )
    }

    pub fn object_type(name: &str, v: ObjectType) -> Self {
        Self::new(name, v.name())
    }

    /// Raw text with surrounding quotes removed
    pub fn unquoted(&self) -> &str {
        let s = self.raw.as_str();
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            &s[1..s.len() - 1]
        } else {
            s
        }
    }
}

fn format_float(v: f32) -> String {
    if v == v.trunc() && v.abs() < 1e9 {
        format!("{:.2}", v)
    } else {
        format!("{}", v)
    }
}

/// One command with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct LevelLine {
    pub command: String,
    pub params: Vec<LevelParam>,
    /// 1-based source line, 0 for lines built in memory
    pub line_number: usize,
    pub file: String,
}

impl LevelLine {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            params: Vec::new(),
            line_number: 0,
            file: String::new(),
        }
    }

    pub fn add_param(&mut self, param: LevelParam) -> &mut Self {
        self.params.retain(|p| p.name != param.name);
        self.params.push(param);
        self
    }

    pub fn with(mut self, param: LevelParam) -> Self {
        self.add_param(param);
        self
    }

    pub fn get(&self, name: &str) -> Option<&LevelParam> {
        self.params.iter().find(|p| p.name == name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    fn missing(&self, name: &str) -> LevelError {
        LevelError::MissingParam {
            file: self.file.clone(),
            line: self.line_number,
            command: self.command.clone(),
            param: name.to_string(),
        }
    }

    fn bad(&self, param: &LevelParam, expected: &'static str) -> LevelError {
        LevelError::BadValue {
            file: self.file.clone(),
            line: self.line_number,
            param: param.name.clone(),
            value: param.raw.clone(),
            expected,
        }
    }

    /// Error tagged with this line's position
    pub fn invalid(&self, message: impl Into<String>) -> LevelError {
        LevelError::Invalid {
            file: self.file.clone(),
            line: self.line_number,
            message: message.into(),
        }
    }

    fn required(&self, name: &str) -> Result<&LevelParam, LevelError> {
        self.get(name).ok_or_else(|| self.missing(name))
    }

    fn convert<T>(
        &self,
        name: &str,
        default: Option<T>,
        expected: &'static str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, LevelError> {
        match (self.get(name), default) {
            (Some(p), _) => parse(p.unquoted()).ok_or_else(|| self.bad(p, expected)),
            (None, Some(d)) => Ok(d),
            (None, None) => Err(self.missing(name)),
        }
    }

    // ------------------------------------------------------------------------
    // Typed accessors
    // ------------------------------------------------------------------------

    pub fn int(&self, name: &str) -> Result<i32, LevelError> {
        self.convert(name, None, "an integer", parse_int)
    }

    pub fn int_or(&self, name: &str, default: i32) -> Result<i32, LevelError> {
        self.convert(name, Some(default), "an integer", parse_int)
    }

    pub fn float(&self, name: &str) -> Result<f32, LevelError> {
        self.convert(name, None, "a number", parse_float)
    }

    pub fn float_or(&self, name: &str, default: f32) -> Result<f32, LevelError> {
        self.convert(name, Some(default), "a number", parse_float)
    }

    pub fn bool(&self, name: &str) -> Result<bool, LevelError> {
        self.convert(name, None, "a boolean", parse_bool)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, LevelError> {
        self.convert(name, Some(default), "a boolean", parse_bool)
    }

    pub fn string(&self, name: &str) -> Result<String, LevelError> {
        self.required(name).map(|p| p.unquoted().to_string())
    }

    pub fn string_or(&self, name: &str, default: &str) -> String {
        self.get(name)
            .map(|p| p.unquoted().to_string())
            .unwrap_or_else(|| default.to_string())
    }

    pub fn point(&self, name: &str) -> Result<Vec3, LevelError> {
        self.convert(name, None, "a point x;y;z", parse_point)
    }

    pub fn point_or(&self, name: &str, default: Vec3) -> Result<Vec3, LevelError> {
        self.convert(name, Some(default), "a point x;y;z", parse_point)
    }

    pub fn color(&self, name: &str) -> Result<Color, LevelError> {
        self.convert(name, None, "a colour r;g;b;a", parse_color)
    }

    pub fn color_or(&self, name: &str, default: Color) -> Result<Color, LevelError> {
        self.convert(name, Some(default), "a colour r;g;b;a", parse_color)
    }

    pub fn object_type(&self, name: &str) -> Result<ObjectType, LevelError> {
        self.convert(name, None, "an object type", ObjectType::from_name)
    }

    pub fn object_type_or(&self, name: &str, default: ObjectType) -> Result<ObjectType, LevelError> {
        self.convert(name, Some(default), "an object type", ObjectType::from_name)
    }

    pub fn camera_type_or(&self, name: &str, default: CameraType) -> Result<CameraType, LevelError> {
        self.convert(name, Some(default), "a camera type", CameraType::from_name)
    }

    /// Space or comma separated list, e.g. `text="a b c"`
    pub fn list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .map(|p| {
                p.unquoted()
                    .split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for LevelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command)?;
        for p in &self.params {
            write!(f, " {}={}", p.name, p.raw)?;
        }
        Ok(())
    }
}

fn parse_int(s: &str) -> Option<i32> {
    s.trim().parse::<i32>().ok().or_else(|| {
        // Integers written as floats ("2.00")
        let f = s.trim().parse::<f32>().ok()?;
        (f == f.trunc()).then_some(f as i32)
    })
}

fn parse_float(s: &str) -> Option<f32> {
    s.trim().parse::<f32>().ok().filter(|v| v.is_finite())
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "1" | "true" | "TRUE" | "True" => Some(true),
        "0" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_point(s: &str) -> Option<Vec3> {
    let parts: Option<Vec<f32>> = s.split(';').map(parse_float).collect();
    match parts?.as_slice() {
        [x, z] => Some(Vec3::new(*x, 0.0, *z)),
        [x, y, z] => Some(Vec3::new(*x, *y, *z)),
        _ => None,
    }
}

fn parse_color(s: &str) -> Option<Color> {
    let parts: Option<Vec<f32>> = s.split(';').map(parse_float).collect();
    match parts?.as_slice() {
        [r, g, b] => Some(Color::new(*r, *g, *b, 0.0)),
        [r, g, b, a] => Some(Color::new(*r, *g, *b, *a)),
        _ => None,
    }
}

/// Parsed level file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LevelParser {
    pub filename: String,
    lines: Vec<LevelLine>,
}

impl LevelParser {
    pub fn new(filename: &str) -> Self {
        Self {
            filename: filename.to_string(),
            lines: Vec::new(),
        }
    }

    /// Parses level text. `filename` is only used for error context.
    pub fn parse_str(filename: &str, text: &str) -> Result<Self, LevelError> {
        let mut parser = Self::new(filename);
        for (index, raw) in text.lines().enumerate() {
            if let Some(line) = parse_line(filename, index + 1, raw)? {
                parser.lines.push(line);
            }
        }
        Ok(parser)
    }

    pub fn load(provider: &dyn LevelProvider, path: &str) -> Result<Self, LevelError> {
        let text = provider.read(path)?;
        Self::parse_str(path, &text)
    }

    pub fn lines(&self) -> &[LevelLine] {
        &self.lines
    }

    pub fn add_line(&mut self, mut line: LevelLine) {
        if line.file.is_empty() {
            line.file = self.filename.clone();
        }
        self.lines.push(line);
    }

    /// First line with `command`
    pub fn find(&self, command: &str) -> Option<&LevelLine> {
        self.lines.iter().find(|l| l.command == command)
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.to_string());
            out.push('\n');
        }
        out
    }

    pub fn save(&self, path: &Path) -> Result<(), LevelError> {
        std::fs::write(path, self.to_text()).map_err(|source| LevelError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}

fn strip_comment(raw: &str) -> &str {
    let mut in_quotes = false;
    let bytes = raw.as_bytes();
    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'/' if !in_quotes && bytes.get(i + 1) == Some(&b'/') => return &raw[..i],
            _ => {}
        }
    }
    raw
}

fn parse_line(file: &str, line_number: usize, raw: &str) -> Result<Option<LevelLine>, LevelError> {
    let text = strip_comment(raw).trim();
    if text.is_empty() {
        return Ok(None);
    }
    let syntax = |message: String| LevelError::Syntax {
        file: file.to_string(),
        line: line_number,
        message,
    };

    let (command, mut rest) = match text.find(char::is_whitespace) {
        Some(i) => (&text[..i], text[i..].trim_start()),
        None => (text, ""),
    };
    if !command.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(syntax(format!("bad command name '{}'", command)));
    }

    let mut line = LevelLine {
        command: command.to_string(),
        params: Vec::new(),
        line_number,
        file: file.to_string(),
    };

    while !rest.is_empty() {
        let eq = rest
            .find('=')
            .ok_or_else(|| syntax(format!("expected name=value near '{}'", rest)))?;
        let name = rest[..eq].trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(syntax(format!("bad parameter name '{}'", name)));
        }
        let after = &rest[eq + 1..];
        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            let end = quoted
                .find('"')
                .ok_or_else(|| syntax(format!("unterminated string in '{}'", name)))?;
            (&after[..end + 2], &quoted[end + 1..])
        } else {
            match after.find(char::is_whitespace) {
                Some(i) => (&after[..i], &after[i..]),
                None => (after, ""),
            }
        };
        line.params.push(LevelParam::new(name, value));
        rest = remaining.trim_start();
    }
    Ok(Some(line))
}
