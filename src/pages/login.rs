use leptos::prelude::*;

use crate::components::handle::ConsoleHandle;

/// Access key prompt shown until the server accepts a key.
#[component]
pub fn Login() -> impl IntoView {
	let handle = expect_context::<ConsoleHandle>();
	let key = RwSignal::new(String::new());

	let submit = move || {
		let value = key.get_untracked();
		handle.run(move |c| async move {
			if c.login(&value).await.is_ok() {
				let _ = c.init().await;
			}
		});
	};

	view! {
		<div class="login-screen">
			<div class="login-card">
				<h2>"Graph Memory Console"</h2>
				<p class="muted">"Enter the access key configured on the server."</p>
				<input
					class="form-input"
					type="password"
					placeholder="Access key"
					prop:value=move || key.get()
					on:input=move |ev| key.set(event_target_value(&ev))
					on:keyup=move |ev| {
						if ev.key() == "Enter" {
							submit();
						}
					}
				/>
				<button class="btn btn-primary" disabled=move || handle.busy.get() on:click=move |_| submit()>
					{move || if handle.busy.get() { "Signing in..." } else { "Sign in" }}
				</button>
			</div>
		</div>
	}
}
