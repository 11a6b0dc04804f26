//! Token model: a closed kind enumeration plus the lexeme and 1-based
//! source position. Operator and keyword tokens carry no lexeme; their text
//! comes from the kind, which keeps the common tokens allocation-free.

use prism_ast::{BaseType, Span};
use std::fmt;

/// Non-type keywords. `true` / `false` surface as [`TokenKind::BoolLit`]
/// instead, and type names as [`TokenKind::Type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    If,
    Else,
    For,
    While,
    Do,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Return,
    Discard,
    Struct,
    Precision,
    Layout,
    Subroutine,
    Const,
    In,
    Out,
    InOut,
    Uniform,
    Buffer,
    Shared,
    Attribute,
    Varying,
    Centroid,
    Sample,
    Patch,
    Invariant,
    Precise,
    Flat,
    Smooth,
    NoPerspective,
    HighP,
    MediumP,
    LowP,
    Coherent,
    Volatile,
    Restrict,
    ReadOnly,
    WriteOnly,
}

impl Keyword {
    pub fn from_word(word: &str) -> Option<Keyword> {
        use Keyword::*;
        Some(match word {
            "if" => If,
            "else" => Else,
            "for" => For,
            "while" => While,
            "do" => Do,
            "switch" => Switch,
            "case" => Case,
            "default" => Default,
            "break" => Break,
            "continue" => Continue,
            "return" => Return,
            "discard" => Discard,
            "struct" => Struct,
            "precision" => Precision,
            "layout" => Layout,
            "subroutine" => Subroutine,
            "const" => Const,
            "in" => In,
            "out" => Out,
            "inout" => InOut,
            "uniform" => Uniform,
            "buffer" => Buffer,
            "shared" => Shared,
            "attribute" => Attribute,
            "varying" => Varying,
            "centroid" => Centroid,
            "sample" => Sample,
            "patch" => Patch,
            "invariant" => Invariant,
            "precise" => Precise,
            "flat" => Flat,
            "smooth" => Smooth,
            "noperspective" => NoPerspective,
            "highp" => HighP,
            "mediump" => MediumP,
            "lowp" => LowP,
            "coherent" => Coherent,
            "volatile" => Volatile,
            "restrict" => Restrict,
            "readonly" => ReadOnly,
            "writeonly" => WriteOnly,
            _ => return None,
        })
    }

    pub fn text(self) -> &'static str {
        use Keyword::*;
        match self {
            If => "if",
            Else => "else",
            For => "for",
            While => "while",
            Do => "do",
            Switch => "switch",
            Case => "case",
            Default => "default",
            Break => "break",
            Continue => "continue",
            Return => "return",
            Discard => "discard",
            Struct => "struct",
            Precision => "precision",
            Layout => "layout",
            Subroutine => "subroutine",
            Const => "const",
            In => "in",
            Out => "out",
            InOut => "inout",
            Uniform => "uniform",
            Buffer => "buffer",
            Shared => "shared",
            Attribute => "attribute",
            Varying => "varying",
            Centroid => "centroid",
            Sample => "sample",
            Patch => "patch",
            Invariant => "invariant",
            Precise => "precise",
            Flat => "flat",
            Smooth => "smooth",
            NoPerspective => "noperspective",
            HighP => "highp",
            MediumP => "mediump",
            LowP => "lowp",
            Coherent => "coherent",
            Volatile => "volatile",
            Restrict => "restrict",
            ReadOnly => "readonly",
            WriteOnly => "writeonly",
        }
    }
}

/// Preprocessor directive keywords. `Version`, `Extension`, `Define` and
/// `Error` attach the rest of the logical line to the token lexeme; the
/// others pass their arguments through as ordinary tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    Version,
    Extension,
    Line,
    Define,
    Undef,
    If,
    Ifdef,
    Ifndef,
    Else,
    Elif,
    Endif,
    Error,
    Pragma,
}

impl Directive {
    pub fn from_word(word: &str) -> Option<Directive> {
        use Directive::*;
        Some(match word {
            "version" => Version,
            "extension" => Extension,
            "line" => Line,
            "define" => Define,
            "undef" => Undef,
            "if" => If,
            "ifdef" => Ifdef,
            "ifndef" => Ifndef,
            "else" => Else,
            "elif" => Elif,
            "endif" => Endif,
            "error" => Error,
            "pragma" => Pragma,
            _ => return None,
        })
    }

    pub fn text(self) -> &'static str {
        use Directive::*;
        match self {
            Version => "version",
            Extension => "extension",
            Line => "line",
            Define => "define",
            Undef => "undef",
            If => "if",
            Ifdef => "ifdef",
            Ifndef => "ifndef",
            Else => "else",
            Elif => "elif",
            Endif => "endif",
            Error => "error",
            Pragma => "pragma",
        }
    }

    /// Whether the rest of the logical line is captured into the lexeme.
    pub fn captures_line(self) -> bool {
        matches!(
            self,
            Directive::Version | Directive::Extension | Directive::Define | Directive::Error
        )
    }
}

/// Operators and punctuators, longest-match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Assign,
    EqEq,
    NotEq,
    Lt,
    Gt,
    Le,
    Ge,
    AndAnd,
    OrOr,
    XorXor,
    Bang,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Shl,
    Shr,
    PlusAssign,
    MinusAssign,
    StarAssign,
    SlashAssign,
    PercentAssign,
    ShlAssign,
    ShrAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
    PlusPlus,
    MinusMinus,
    Question,
    Colon,
    Semicolon,
    Comma,
    Dot,
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
}

impl Op {
    pub fn text(self) -> &'static str {
        use Op::*;
        match self {
            Plus => "+",
            Minus => "-",
            Star => "*",
            Slash => "/",
            Percent => "%",
            Assign => "=",
            EqEq => "==",
            NotEq => "!=",
            Lt => "<",
            Gt => ">",
            Le => "<=",
            Ge => ">=",
            AndAnd => "&&",
            OrOr => "||",
            XorXor => "^^",
            Bang => "!",
            Amp => "&",
            Pipe => "|",
            Caret => "^",
            Tilde => "~",
            Shl => "<<",
            Shr => ">>",
            PlusAssign => "+=",
            MinusAssign => "-=",
            StarAssign => "*=",
            SlashAssign => "/=",
            PercentAssign => "%=",
            ShlAssign => "<<=",
            ShrAssign => ">>=",
            AmpAssign => "&=",
            PipeAssign => "|=",
            CaretAssign => "^=",
            PlusPlus => "++",
            MinusMinus => "--",
            Question => "?",
            Colon => ":",
            Semicolon => ";",
            Comma => ",",
            Dot => ".",
            LParen => "(",
            RParen => ")",
            LBracket => "[",
            RBracket => "]",
            LBrace => "{",
            RBrace => "}",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    IntLit,
    UintLit,
    FloatLit,
    DoubleLit,
    BoolLit(bool),
    Ident,
    /// Built-in variable name (`gl_Position`, `gl_FragColor`, ...).
    Builtin,
    Type(BaseType),
    Kw(Keyword),
    Op(Op),
    Directive(Directive),
    /// Unrecognized byte; the parser reports it.
    Error,
    Eof,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Empty for operators, keywords, types and EOF; their text is derived
    /// from the kind.
    pub lexeme: String,
    pub line: u32,
    pub column: u32,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            column,
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    /// Source text of the token regardless of whether a lexeme is stored.
    pub fn text(&self) -> &str {
        match self.kind {
            TokenKind::Op(op) => op.text(),
            TokenKind::Kw(kw) => kw.text(),
            TokenKind::Type(base) => base.keyword().unwrap_or(""),
            TokenKind::BoolLit(true) => "true",
            TokenKind::BoolLit(false) => "false",
            TokenKind::Eof => "<eof>",
            _ => &self.lexeme,
        }
    }

    /// Lazily parse an integer literal (handles hex, octal, decimal and the
    /// unsigned suffix). `None` when the token is not an integer literal or
    /// the value overflows.
    pub fn int_value(&self) -> Option<i64> {
        if !matches!(self.kind, TokenKind::IntLit | TokenKind::UintLit) {
            return None;
        }
        let digits = self
            .lexeme
            .trim_end_matches(['u', 'U']);
        if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
            return i64::from_str_radix(hex, 16).ok();
        }
        if digits.len() > 1 && digits.starts_with('0') && digits.bytes().all(|b| (b'0'..=b'7').contains(&b)) {
            return i64::from_str_radix(&digits[1..], 8).ok();
        }
        digits.parse().ok()
    }

    pub fn uint_value(&self) -> Option<u64> {
        self.int_value().and_then(|v| u64::try_from(v).ok())
    }

    /// Lazily parse a float/double literal, stripping the `f` / `lf` suffix.
    pub fn float_value(&self) -> Option<f64> {
        if !matches!(self.kind, TokenKind::FloatLit | TokenKind::DoubleLit) {
            return None;
        }
        let digits = self
            .lexeme
            .trim_end_matches(['f', 'F'])
            .trim_end_matches(['l', 'L']);
        digits.parse().ok()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.text(), self.line, self.column)
    }
}

/// The closed set of recognized built-in variable names, modern and legacy.
pub fn is_builtin_name(name: &str) -> bool {
    matches!(
        name,
        // Modern
        "gl_Position"
            | "gl_PointSize"
            | "gl_ClipDistance"
            | "gl_CullDistance"
            | "gl_VertexID"
            | "gl_InstanceID"
            | "gl_PrimitiveID"
            | "gl_PrimitiveIDIn"
            | "gl_InvocationID"
            | "gl_Layer"
            | "gl_ViewportIndex"
            | "gl_TessCoord"
            | "gl_TessLevelOuter"
            | "gl_TessLevelInner"
            | "gl_PatchVerticesIn"
            | "gl_FragCoord"
            | "gl_FrontFacing"
            | "gl_FragDepth"
            | "gl_SampleID"
            | "gl_SamplePosition"
            | "gl_SampleMask"
            | "gl_NumWorkGroups"
            | "gl_WorkGroupSize"
            | "gl_WorkGroupID"
            | "gl_LocalInvocationID"
            | "gl_GlobalInvocationID"
            | "gl_LocalInvocationIndex"
            // Legacy outputs / inputs
            | "gl_FragColor"
            | "gl_FragData"
            | "gl_Vertex"
            | "gl_Normal"
            | "gl_Color"
            | "gl_SecondaryColor"
            | "gl_FogCoord"
            | "gl_MultiTexCoord0"
            | "gl_MultiTexCoord1"
            | "gl_MultiTexCoord2"
            | "gl_MultiTexCoord3"
            | "gl_MultiTexCoord4"
            | "gl_MultiTexCoord5"
            | "gl_MultiTexCoord6"
            | "gl_MultiTexCoord7"
            // Legacy varyings
            | "gl_TexCoord"
            | "gl_FogFragCoord"
            | "gl_FrontColor"
            | "gl_BackColor"
            | "gl_FrontSecondaryColor"
            | "gl_BackSecondaryColor"
            // Legacy matrix stack
            | "gl_ModelViewMatrix"
            | "gl_ProjectionMatrix"
            | "gl_ModelViewProjectionMatrix"
            | "gl_NormalMatrix"
            | "gl_ModelViewMatrixInverse"
            | "gl_ProjectionMatrixInverse"
            | "gl_ModelViewProjectionMatrixInverse"
            | "gl_ModelViewMatrixTranspose"
            | "gl_ProjectionMatrixTranspose"
            | "gl_ModelViewProjectionMatrixTranspose"
            | "gl_TextureMatrix"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_values_parse_lazily() {
        let t = Token::new(TokenKind::IntLit, "0x1F", 1, 1);
        assert_eq!(t.int_value(), Some(31));
        let t = Token::new(TokenKind::IntLit, "017", 1, 1);
        assert_eq!(t.int_value(), Some(15));
        let t = Token::new(TokenKind::UintLit, "42u", 1, 1);
        assert_eq!(t.uint_value(), Some(42));
        let t = Token::new(TokenKind::IntLit, "0", 1, 1);
        assert_eq!(t.int_value(), Some(0));
    }

    #[test]
    fn float_values_strip_suffixes() {
        let t = Token::new(TokenKind::FloatLit, "1.5f", 1, 1);
        assert_eq!(t.float_value(), Some(1.5));
        let t = Token::new(TokenKind::DoubleLit, "2.5lf", 1, 1);
        assert_eq!(t.float_value(), Some(2.5));
        let t = Token::new(TokenKind::FloatLit, "1e3", 1, 1);
        assert_eq!(t.float_value(), Some(1000.0));
    }

    #[test]
    fn text_comes_from_kind_for_flyweights() {
        let t = Token::new(TokenKind::Op(Op::ShlAssign), "", 1, 1);
        assert_eq!(t.text(), "<<=");
        let t = Token::new(TokenKind::Kw(Keyword::NoPerspective), "", 1, 1);
        assert_eq!(t.text(), "noperspective");
    }

    #[test]
    fn builtin_set_membership() {
        assert!(is_builtin_name("gl_Position"));
        assert!(is_builtin_name("gl_ModelViewProjectionMatrix"));
        assert!(!is_builtin_name("gl_MadeUp"));
        assert!(!is_builtin_name("position"));
    }
}
