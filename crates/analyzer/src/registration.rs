//! What a REGISTER exchange does to the registrar's bindings

use crate::message::SipMessage;
use crate::types::Method;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RegistrationSummary {
    /// `Contact: *` with `Expires: 0`
    RemoveAll,
    /// Some contacts expire now, the rest are added or refreshed
    Remove { remove: usize, add: usize },
    /// A REGISTER without contacts queries the current bindings
    Fetch,
    /// Bindings listed in a request or a 2xx response
    Bindings { count: usize },
    /// 2xx response listing expired bindings
    Removed { removed: usize, kept: usize },
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

impl fmt::Display for RegistrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RegistrationSummary::RemoveAll => f.write_str("remove all bindings"),
            RegistrationSummary::Remove { remove, add } => {
                write!(f, "remove {} binding{}", remove, plural(remove))?;
                if add > 0 {
                    write!(f, ", add {} binding{}", add, plural(add))?;
                }
                Ok(())
            }
            RegistrationSummary::Fetch => f.write_str("fetch bindings"),
            RegistrationSummary::Bindings { count } => write!(f, "{} binding{}", count, plural(count)),
            RegistrationSummary::Removed { removed, kept } => {
                write!(f, "removed {} binding{}", removed, plural(removed))?;
                if kept > 0 {
                    write!(f, ", {} binding{} kept", kept, plural(kept))?;
                }
                Ok(())
            }
        }
    }
}

/// Summarise a REGISTER request or a 2xx response to one; `None` otherwise.
///
/// Contacts without an `expires` parameter take the message `Expires` value,
/// so with `Expires: 0` they count as removed.
pub fn summarize_registration(message: &SipMessage) -> Option<RegistrationSummary> {
    let contacts = &message.contacts;
    let mut expiring = contacts.expires_zero;
    if message.expires_is_0 {
        expiring += contacts.expires_unknown;
    }
    let remaining = contacts.count.saturating_sub(expiring);

    if message.method() == Some(&Method::Register) {
        let summary = if contacts.star && message.expires_is_0 {
            RegistrationSummary::RemoveAll
        } else if expiring > 0 {
            RegistrationSummary::Remove {
                remove: expiring,
                add: remaining,
            }
        } else if contacts.count == 0 {
            RegistrationSummary::Fetch
        } else {
            RegistrationSummary::Bindings {
                count: contacts.count,
            }
        };
        return Some(summary);
    }

    let code = message.status_code()?;
    let answers_register = message
        .cseq
        .as_ref()
        .map_or(false, |cseq| cseq.method == Method::Register);
    if !answers_register || !(200..300).contains(&code) {
        return None;
    }
    Some(if expiring > 0 {
        RegistrationSummary::Removed {
            removed: expiring,
            kept: remaining,
        }
    } else {
        RegistrationSummary::Bindings {
            count: contacts.count,
        }
    })
}
