//! Form page rendering

/// Result line shown above the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    fn css_class(self) -> &'static str {
        match self {
            NoticeKind::Success => "notice success",
            NoticeKind::Error => "notice error",
        }
    }
}

/// Escape text for an HTML body or attribute
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render the mashup form, optionally with a notice
pub fn render_page(notice: Option<(NoticeKind, &str)>) -> String {
    let notice_html = match notice {
        Some((kind, text)) => format!(
            r#"<div class="{}">{}</div>"#,
            kind.css_class(),
            escape_html(text)
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Mashup Generator</title>
    <style>
        * {{
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }}
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background-color: #1a1a1a;
            color: #e0e0e0;
            line-height: 1.6;
        }}
        header {{
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 20px;
            margin-bottom: 30px;
        }}
        h1 {{
            font-size: 26px;
            color: #4a9eff;
        }}
        .subtitle {{
            color: #888;
            font-size: 16px;
        }}
        .content {{
            max-width: 480px;
            padding: 0 20px;
        }}
        label {{
            display: block;
            margin-top: 14px;
            color: #bbb;
        }}
        input {{
            width: 100%;
            padding: 8px;
            background: #2a2a2a;
            border: 1px solid #3a3a3a;
            border-radius: 4px;
            color: #e0e0e0;
        }}
        .button {{
            margin-top: 20px;
            padding: 10px 20px;
            background: #4a9eff;
            color: white;
            border: none;
            border-radius: 4px;
            font-weight: 600;
            cursor: pointer;
        }}
        .button:hover {{
            background: #3a8eef;
        }}
        .notice {{
            padding: 10px 14px;
            border-radius: 4px;
            margin-bottom: 10px;
        }}
        .success {{
            background: #10b981;
            color: #fff;
        }}
        .error {{
            background: #ef4444;
            color: #fff;
        }}
    </style>
</head>
<body>
    <header>
        <h1>Mashup Generator</h1>
        <div class="subtitle">
            Build one audio mashup from a singer's videos and receive it by email
        </div>
    </header>
    <div class="content">
        {notice}
        <form method="post" action="/">
            <label for="singer">Singer name</label>
            <input type="text" id="singer" name="singer">
            <label for="num">Number of videos (more than 10)</label>
            <input type="text" id="num" name="num">
            <label for="duration">Duration of each clip in seconds (more than 20)</label>
            <input type="text" id="duration" name="duration">
            <label for="email">Email address</label>
            <input type="text" id="email" name="email">
            <button class="button" type="submit">Create Mashup</button>
        </form>
    </div>
</body>
</html>
"#,
        notice = notice_html
    )
}
