//! Input binding and validation for the HTML forms.
//!
//! Forms deserialize from urlencoded or multipart bodies, validate into a
//! clean value or a set of [`FormErrors`], and render their own widgets so a
//! re-rendered form keeps what the user typed.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::db::models::{Group, Post};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice.";
pub const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;

/// Field name -> messages, plus errors that belong to no single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    non_field: Vec<String>,
}

impl FormErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.non_field.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.non_field.is_empty()
    }

    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn non_field(&self) -> &[String] {
        &self.non_field
    }

    fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

// --- Widgets ---

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn input(input_type: &str, name: &str, value: &str, required: bool) -> String {
    format!(
        r#"<input type="{}" name="{}" id="id_{}" value="{}"{}>"#,
        input_type,
        name,
        name,
        escape(value),
        if required { " required" } else { "" }
    )
}

pub fn textarea(name: &str, value: &str, required: bool) -> String {
    format!(
        r#"<textarea name="{}" id="id_{}" cols="40" rows="10"{}>{}</textarea>"#,
        name,
        name,
        if required { " required" } else { "" },
        escape(value)
    )
}

/// `<select>` with an empty "---------" choice first.
pub fn select(name: &str, choices: &[(String, String)], selected: &str) -> String {
    let mut html = format!(r#"<select name="{}" id="id_{}">"#, name, name);
    html.push_str(r#"<option value="">---------</option>"#);
    for (value, label) in choices {
        html.push_str(&format!(
            r#"<option value="{}"{}>{}</option>"#,
            escape(value),
            if value == selected { " selected" } else { "" },
            escape(label)
        ));
    }
    html.push_str("</select>");
    html
}

pub fn file_input(name: &str, accept: &str) -> String {
    format!(
        r#"<input type="file" name="{}" id="id_{}" accept="{}">"#,
        name, name, accept
    )
}

// --- Images ---

/// An uploaded file as received from a multipart body.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

/// A validated image, with the extension derived from its content.
#[derive(Debug, Clone)]
pub struct CleanImage {
    pub extension: &'static str,
    pub data: Vec<u8>,
}

/// Identify an image by its magic bytes.
pub fn sniff_image(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a") {
        Some("gif")
    } else if data.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

const IMAGE_EXTENSIONS: [&str; 5] = ["gif", "jpg", "jpeg", "png", "webp"];

impl ImageUpload {
    /// Extension, content type and magic bytes must all say "image".
    fn clean(self) -> Result<CleanImage, &'static str> {
        let extension_ok = match self.filename.rsplit_once('.') {
            Some((_, ext)) => IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()),
            None => self.filename.is_empty(),
        };
        let declared_ok = self
            .content_type
            .as_deref()
            .map(|ct| ct.starts_with("image/"))
            .unwrap_or(true);
        match sniff_image(&self.data) {
            Some(extension) if extension_ok && declared_ok => Ok(CleanImage {
                extension,
                data: self.data,
            }),
            _ => Err(INVALID_IMAGE),
        }
    }
}

// --- Posts ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Clone)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<CleanImage>,
}

impl PostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
        }
    }

    /// `groups` are the valid choices for the group field.
    pub fn validate(
        &self,
        groups: &[Group],
        image: Option<ImageUpload>,
    ) -> Result<CleanPost, FormErrors> {
        let mut errors = FormErrors::default();

        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    errors.add("group", INVALID_CHOICE);
                    None
                }
            }
        };

        let image = match image.filter(|upload| !upload.data.is_empty()) {
            Some(upload) => match upload.clean() {
                Ok(clean) => Some(clean),
                Err(message) => {
                    errors.add("image", message);
                    None
                }
            },
            None => None,
        };

        errors.into_result(CleanPost {
            text: text.to_string(),
            group_id,
            image,
        })
    }

    pub fn text_widget(&self) -> String {
        textarea("text", &self.text, true)
    }

    pub fn group_widget(&self, groups: &[Group]) -> String {
        let choices: Vec<(String, String)> = groups
            .iter()
            .map(|g| (g.id.to_string(), g.title.clone()))
            .collect();
        select("group", &choices, self.group.trim())
    }

    pub fn image_widget(&self) -> String {
        file_input("image", "image/*")
    }
}

// --- Comments ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<String, FormErrors> {
        let mut errors = FormErrors::default();
        let text = self.text.trim();
        if text.is_empty() {
            errors.add("text", REQUIRED);
        }
        errors.into_result(text.to_string())
    }

    pub fn text_widget(&self) -> String {
        textarea("text", &self.text, true)
    }
}

// --- Accounts ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

fn valid_username(name: &str) -> bool {
    name.chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

impl SignupForm {
    /// Field-level checks. Uniqueness needs the database and is checked by the caller.
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();

        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED);
        } else if username.chars().count() > USERNAME_MAX {
            errors.add(
                "username",
                format!("Ensure this value has at most {} characters.", USERNAME_MAX),
            );
        } else if !valid_username(username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }

        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            errors.add("email", "Enter a valid email address.");
        }

        if self.password1.is_empty() {
            errors.add("password1", REQUIRED);
        } else if self.password1.chars().count() < PASSWORD_MIN {
            errors.add(
                "password1",
                format!(
                    "This password is too short. It must contain at least {} characters.",
                    PASSWORD_MIN
                ),
            );
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED);
        } else if self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors.into_result(())
    }

    pub fn widget(&self, field: &str) -> String {
        match field {
            "first_name" => input("text", field, &self.first_name, false),
            "last_name" => input("text", field, &self.last_name, false),
            "username" => input("text", field, &self.username, true),
            "email" => input("email", field, &self.email, false),
            "password1" | "password2" => input("password", field, "", true),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after a successful login.
    #[serde(default)]
    pub next: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = FormErrors::default();
        if self.username.trim().is_empty() {
            errors.add("username", REQUIRED);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED);
        }
        errors.into_result(())
    }

    pub fn widget(&self, field: &str) -> String {
        match field {
            "username" => input("text", field, &self.username, true),
            "password" => input("password", field, "", true),
            _ => String::new(),
        }
    }
}
