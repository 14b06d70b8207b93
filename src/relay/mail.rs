use super::{
    RelayError,
    form::{BookingRequest, ContactRequest},
};
use lettre::{
    Address, FileTransport, Message, Transport,
    message::{Mailbox, header::ContentType},
};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};

/// Who relayed mail comes from and goes to.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct MailSettings {
    /// The inbox form submissions are relayed to.
    pub(crate) recipient: String,

    pub(crate) from_name: String,

    pub(crate) from_email: String,

    /// Named in the footer of every message.
    pub(crate) site_name: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            recipient: "hello@example.com".into(),
            from_name: "Website".into(),
            from_email: "noreply@example.com".into(),
            site_name: "Kraven".into(),
        }
    }
}

impl MailSettings {
    fn sender(&self) -> Result<Mailbox, RelayError> {
        Ok(Mailbox::new(Some(single_line(&self.from_name)), self.from_email.parse()?))
    }

    fn recipient(&self) -> Result<Mailbox, RelayError> {
        Ok(self.recipient.parse()?)
    }
}

// Header values must stay on one line.
fn single_line(text: &str) -> String {
    text.split(|c: char| c.is_control()).filter(|part| !part.is_empty()).collect::<Vec<_>>().join(" ")
}

fn crlf(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "\r\n")
}

fn compose(settings: &MailSettings, reply_to: &str, subject: &str, text: &str) -> Result<Message, RelayError> {
    let reply_to = reply_to.parse::<Address>().map_err(|_| RelayError::InvalidEmail)?;
    let message = Message::builder()
        .from(settings.sender()?)
        .to(settings.recipient()?)
        .reply_to(Mailbox::new(None, reply_to))
        .subject(single_line(subject))
        .header(ContentType::TEXT_PLAIN)
        .body(crlf(text))?;
    Ok(message)
}

pub(crate) fn compose_contact(request: &ContactRequest, settings: &MailSettings) -> Result<Message, RelayError> {
    let text = format!(
        "New Contact Form Submission\n\
         ===========================\n\
         \n\
         Sender Information:\n\
         - Name: {}\n\
         - Email: {}\n\
         \n\
         Message:\n\
         {}\n\
         \n\
         ---\n\
         This email was sent from the {} website contact form.\n",
        request.name, request.email, request.message, settings.site_name
    );
    let subject = format!("New Contact Form Submission from {}", request.name);
    compose(settings, &request.email, &subject, &text)
}

pub(crate) fn compose_booking(request: &BookingRequest, settings: &MailSettings) -> Result<Message, RelayError> {
    let mut text = String::from("New Booking Request\n===================\n\n");
    // writing into a String never fails
    let _ = writeln!(text, "Package: {}", request.package_name);
    let _ = writeln!(text, "Price: {}\n", request.package_price);
    let _ = writeln!(text, "Contact Information:\n- Name: {}\n- Email: {}", request.name, request.email);
    if let Some(telegram) = &request.telegram {
        let _ = writeln!(text, "- Telegram: {telegram}");
    }
    let _ = writeln!(text, "\nProject Details:\n- Project Name: {}", request.project_name);
    if let Some(budget) = &request.budget {
        let _ = writeln!(text, "- Budget: {budget}");
    }
    let _ = writeln!(text, "\nProject Description:\n{}\n", request.project_description);
    let _ = writeln!(text, "---\nThis booking request was submitted via the {} website.", settings.site_name);
    let subject = format!("New Booking Request: {} - {}", request.package_name, request.project_name);
    compose(settings, &request.email, &subject, &text)
}

/// Delivers composed messages.
pub(crate) trait Mailer {
    fn send(&mut self, message: &Message) -> Result<(), RelayError>;
}

/// Writes every message as an `.eml` file into a directory.
pub(crate) struct OutboxMailer {
    directory: PathBuf,
    transport: FileTransport,
}

impl OutboxMailer {
    pub(crate) fn new<P: Into<PathBuf>>(directory: P) -> Self {
        let directory = directory.into();
        Self { transport: FileTransport::new(&directory), directory }
    }

    pub(crate) fn directory(&self) -> &Path {
        &self.directory
    }
}

impl Mailer for OutboxMailer {
    fn send(&mut self, message: &Message) -> Result<(), RelayError> {
        fs::create_dir_all(&self.directory)
            .map_err(|source| RelayError::Delivery { path: self.directory.clone(), source })?;
        let id = self.transport.send(message)?;
        log::info!("wrote {id}.eml to {}", self.directory.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(telegram: Option<&str>, budget: Option<&str>) -> BookingRequest {
        BookingRequest {
            name: "Jane".into(),
            email: "jane@example.com".into(),
            telegram: telegram.map(Into::into),
            project_name: "Orbit".into(),
            project_description: "Line one\nLine two".into(),
            budget: budget.map(Into::into),
            package_name: "Launch".into(),
            package_price: "$5,000".into(),
        }
    }

    fn contact(name: &str, message: &str) -> ContactRequest {
        ContactRequest { name: name.into(), email: "jane@example.com".into(), message: message.into() }
    }

    fn split(message: &Message) -> (Vec<String>, String) {
        let eml = String::from_utf8(message.formatted()).expect("message is not utf-8");
        let (headers, body) = eml.split_once("\r\n\r\n").expect("no header/body separator");
        (headers.split("\r\n").map(String::from).collect(), body.to_string())
    }

    fn header<'a>(headers: &'a [String], name: &str) -> &'a str {
        let prefix = format!("{name}: ");
        headers.iter().find_map(|line| line.strip_prefix(&prefix)).unwrap_or_else(|| panic!("no {name} header"))
    }

    #[test]
    fn contact_message() {
        let message = compose_contact(&contact("Jane", "Hello"), &MailSettings::default()).unwrap();
        let (headers, body) = split(&message);
        assert_eq!(header(&headers, "Subject"), "New Contact Form Submission from Jane");
        assert!(header(&headers, "From").contains("noreply@example.com"));
        assert!(header(&headers, "To").contains("hello@example.com"));
        assert!(header(&headers, "Reply-To").contains("jane@example.com"));
        assert!(body.contains("- Name: Jane\r\n- Email: jane@example.com\r\n\r\nMessage:\r\nHello\r\n"));
    }

    #[test]
    fn line_breaks_cannot_add_headers() {
        let request = contact("Eve\r\nBcc: victim@example.org", "hi");
        let message = compose_contact(&request, &MailSettings::default()).unwrap();
        let (headers, _) = split(&message);
        assert!(headers.iter().all(|line| !line.starts_with("Bcc:")), "{headers:?}");
        assert_eq!(header(&headers, "Subject"), "New Contact Form Submission from Eve Bcc: victim@example.org");
    }

    #[test]
    fn existing_crlf_is_not_doubled() {
        let message = compose_contact(&contact("Jane", "one\r\ntwo\nthree"), &MailSettings::default()).unwrap();
        let (_, body) = split(&message);
        assert!(body.contains("Message:\r\none\r\ntwo\r\nthree\r\n"));
        assert!(!body.contains("\r\r"));
    }

    #[test]
    fn booking_message_with_optionals() {
        let message = compose_booking(&booking(Some("@jane"), Some("10k")), &MailSettings::default()).unwrap();
        let (headers, body) = split(&message);
        assert_eq!(header(&headers, "Subject"), "New Booking Request: Launch - Orbit");
        assert!(body.starts_with("New Booking Request\r\n"));
        assert!(body.contains("Package: Launch\r\nPrice: $5,000\r\n"));
        assert!(body.contains("- Telegram: @jane\r\n"));
        assert!(body.contains("- Project Name: Orbit\r\n- Budget: 10k\r\n"));
        assert!(body.contains("Project Description:\r\nLine one\r\nLine two\r\n"));
    }

    #[test]
    fn booking_message_skips_missing_optionals() {
        let message = compose_booking(&booking(None, None), &MailSettings::default()).unwrap();
        let (_, body) = split(&message);
        assert!(!body.contains("Telegram"));
        assert!(!body.contains("Budget"));
    }

    #[test]
    fn bad_settings_address_is_reported() {
        let settings = MailSettings { recipient: "not an address".into(), ..Default::default() };
        let error = compose_booking(&booking(None, None), &settings).unwrap_err();
        assert!(matches!(error, RelayError::Address(_)));
    }

    #[test]
    fn outbox_writes_eml_files() {
        let dir = tempfile::tempdir().expect("no temp dir");
        let mut mailer = OutboxMailer::new(dir.path().join("outbox"));
        let message = compose_booking(&booking(None, None), &MailSettings::default()).unwrap();
        mailer.send(&message).unwrap();
        mailer.send(&message).unwrap();

        let files: Vec<_> = fs::read_dir(mailer.directory()).unwrap().collect::<Result<_, _>>().unwrap();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|file| file.path().extension().is_some_and(|extension| extension == "eml")));
        let contents = fs::read_to_string(files[0].path()).unwrap();
        assert!(contents.contains("Subject: New Booking Request: Launch - Orbit\r\n"));
        assert!(contents.contains("\r\n\r\nNew Booking Request\r\n"));
    }
}
