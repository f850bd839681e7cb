//! Static error page for unmatched routes.

use dioxus::prelude::*;

/// Props for ErrorPage component.
#[derive(Props, Clone, PartialEq)]
pub struct ErrorPageProps {
    /// Error code to display.
    pub kind: String,
    /// The path that failed to resolve.
    pub url: String,
}

/// Pure function of `(kind, url)` to markup. No state, no side effects.
#[component]
pub fn ErrorPage(props: ErrorPageProps) -> Element {
    rsx! {
        section { class: "error",
            h2 { "Error {props.kind}" }
            p { "It looks like we hit a snag." }
            pre { "{props.url}" }

            div {
                "Go to "
                a { href: "/", "home" }
            }
        }
    }
}
