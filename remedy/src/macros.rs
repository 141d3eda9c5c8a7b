/// Creates a single chat [`Message`](crate::Message) from a role shorthand.
///
/// ```rust
/// use remedy::{Role, rd_msg};
///
/// let message = rd_msg!(assistant => "Done.");
/// assert_eq!(message.role, Role::Assistant);
/// assert_eq!(message.content, "Done.");
/// ```
#[macro_export]
macro_rules! rd_msg {
    (system => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::System, $content)
    };
    (user => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::User, $content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Assistant, $content)
    };
    (tool => $content:expr $(,)?) => {
        $crate::Message::new($crate::Role::Tool, $content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use system, user, assistant, or tool");
    };
}

/// Creates a `Vec<Message>` from role/content pairs.
///
/// ```rust
/// use remedy::{Role, rd_messages};
///
/// let messages = rd_messages![
///     system => "You are a careful medical assistant.",
///     user => "I have had a headache for three days.",
/// ];
///
/// assert_eq!(messages.len(), 2);
/// assert_eq!(messages[0].role, Role::System);
/// assert_eq!(messages[1].role, Role::User);
/// ```
#[macro_export]
macro_rules! rd_messages {
    () => {
        Vec::<$crate::Message>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::rd_msg!($role => $content)),+]
    };
}

/// Creates the `Vec<String>` key list a
/// [`CredentialPool`](crate::CredentialPool) is built from.
///
/// ```rust
/// use remedy::{CredentialPool, rd_keys};
///
/// let pool = CredentialPool::new(rd_keys!["key-a", "key-b"]).unwrap();
/// assert_eq!(pool.len(), 2);
/// ```
#[macro_export]
macro_rules! rd_keys {
    () => {
        Vec::<String>::new()
    };
    ($($key:expr),+ $(,)?) => {
        vec![$(String::from($key)),+]
    };
}
