use leptos::prelude::*;

use super::handle::ConsoleHandle;
use crate::console::NoticeLevel;

#[component]
pub fn ToastStack() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let toasts = handle.toasts;

	view! {
		<div class="toast-stack" aria-live="polite">
			<For
				each=move || toasts.get()
				key=|t| t.id
				children=move |t| {
					let id = t.id;
					let class = match t.notice.level {
						NoticeLevel::Info => "toast info",
						NoticeLevel::Success => "toast success",
						NoticeLevel::Warning => "toast warning",
						NoticeLevel::Error => "toast error",
					};
					view! {
						<div class=class>
							<div class="toast-body">
								<strong>{t.notice.title}</strong>
								<p>{t.notice.message}</p>
							</div>
							<button
								class="icon-btn"
								title="Dismiss"
								on:click=move |_| toasts.update(|all| all.retain(|x| x.id != id))
							>
								"×"
							</button>
						</div>
					}
				}
			/>
		</div>
	}
}
